//! Per-bar feature table: bar fields, indicator columns and the signal column.
//!
//! Rebuilt from scratch on every reload; nothing here is carried between
//! calls.

use serde::Serialize;

use super::{Indicator, Macd, Rsi, Sma, Stochastic, StochasticLine};
use crate::detector::{DetectorParams, SignalDetector};
use crate::domain::{PriceBar, Signal};

#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub ma_50: f64,
    pub rsi: f64,
    pub macd: f64,
    pub stoch_k: f64,
    pub stoch_signal: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn compute(bars: &[PriceBar], params: DetectorParams) -> Self {
        let ma_50 = Sma::new(50).compute(bars);
        let rsi = Rsi::default().compute(bars);
        let macd = Macd::default().compute(bars);
        let stoch_k = Stochastic::standard(StochasticLine::K).compute(bars);
        let stoch_signal = Stochastic::standard(StochasticLine::Signal).compute(bars);
        let signals = SignalDetector::new(params).classify(bars);

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| FeatureRow {
                bar: bar.clone(),
                ma_50: ma_50[i],
                rsi: rsi[i],
                macd: macd[i],
                stoch_k: stoch_k[i],
                stoch_signal: stoch_signal[i],
                signal: signals[i],
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in row order, for tabular writers.
    pub fn columns() -> [&'static str; 13] {
        [
            "time",
            "open",
            "high",
            "low",
            "close",
            "volume",
            "ma_50",
            "rsi",
            "macd",
            "stoch_k",
            "stoch_signal",
            "signal",
            "signal_code",
        ]
    }
}
