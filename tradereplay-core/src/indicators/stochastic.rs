//! Stochastic oscillator.
//!
//! raw %K = 100 * (close - lowest low) / (highest high - lowest low) over
//! `k_length` bars, %K = rolling mean of raw %K over `k_period`, %D = rolling
//! mean of %K over `d_period`.
//!
//! The `Signal` line encodes crossings for plotting next to price: 1.27 when
//! %K < 10 and %K crosses above %D, 1.30 when %K > 90 and %K crosses below %D,
//! otherwise 1.25.

use super::{rolling_max, rolling_mean, rolling_min, Indicator};
use crate::domain::PriceBar;

pub const STOCH_BUY: f64 = 1.27;
pub const STOCH_SELL: f64 = 1.30;
pub const STOCH_NEUTRAL: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_length: usize,
    k_period: usize,
    d_period: usize,
    line: StochasticLine,
    name: String,
}

impl Stochastic {
    pub fn new(k_length: usize, k_period: usize, d_period: usize, line: StochasticLine) -> Self {
        assert!(
            k_length >= 1 && k_period >= 1 && d_period >= 1,
            "stochastic periods must be >= 1"
        );
        let suffix = match line {
            StochasticLine::K => "k",
            StochasticLine::D => "d",
            StochasticLine::Signal => "signal",
        };
        Self {
            k_length,
            k_period,
            d_period,
            line,
            name: format!("stoch_{k_length}_{k_period}_{d_period}_{suffix}"),
        }
    }

    /// The 20/3/3 configuration used by the feature table.
    pub fn standard(line: StochasticLine) -> Self {
        Self::new(20, 3, 3, line)
    }

    fn k_and_d(&self, bars: &[PriceBar]) -> (Vec<f64>, Vec<f64>) {
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lowest = rolling_min(&lows, self.k_length);
        let highest = rolling_max(&highs, self.k_length);

        let raw_k: Vec<f64> = bars
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let range = highest[i] - lowest[i];
                if range > 0.0 {
                    100.0 * (b.close - lowest[i]) / range
                } else {
                    f64::NAN
                }
            })
            .collect();

        let k = rolling_mean(&raw_k, self.k_period);
        let d = rolling_mean(&k, self.d_period);
        (k, d)
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k_lookback = self.k_length + self.k_period - 2;
        match self.line {
            StochasticLine::K => k_lookback,
            StochasticLine::D => k_lookback + self.d_period - 1,
            StochasticLine::Signal => 0,
        }
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let (k, d) = self.k_and_d(bars);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => d,
            StochasticLine::Signal => (0..bars.len())
                .map(|i| {
                    // NaN comparisons are false, so warmup bars stay neutral.
                    let crossed_up = i > 0 && k[i] > d[i] && k[i - 1] < d[i - 1];
                    let crossed_down = i > 0 && k[i] < d[i] && k[i - 1] > d[i - 1];
                    if k[i] < 10.0 && crossed_up {
                        STOCH_BUY
                    } else if k[i] > 90.0 && crossed_down {
                        STOCH_SELL
                    } else {
                        STOCH_NEUTRAL
                    }
                })
                .collect(),
        }
    }
}
