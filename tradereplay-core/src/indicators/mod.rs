//! Feature indicators shown alongside the replayed series.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per bar. Warmup positions are `f64::NAN`. No value at bar t depends on
//! bars after t.
//!
//! Multi-line indicators (stochastic) expose one named instance per line,
//! keeping the single-series `Indicator` trait.

pub mod features;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use features::{FeatureRow, FeatureTable};
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticLine};

use crate::domain::PriceBar;

pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_50", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are NaN.
    fn lookback(&self) -> usize;

    /// Compute over the whole series. Output length equals `bars.len()`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Rolling mean; NaN until the window is full or while it holds a NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

fn rolling(values: &[f64], period: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for (i, w) in values.windows(period).enumerate() {
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i + period - 1] = f(w);
    }
    out
}

/// Exponentially weighted mean without bias adjustment:
/// `y[0] = x[0]`, `y[t] = (1 - alpha) * y[t-1] + alpha * x[t]`.
///
/// Leading NaNs stay NaN; the recursion is seeded at the first finite value.
/// A NaN after the seed taints the rest of the series.
pub fn ewm(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    let mut prev = values[start];
    out[start] = prev;
    for i in (start + 1)..values.len() {
        if values[i].is_nan() {
            break;
        }
        prev = (1.0 - alpha) * prev + alpha * values[i];
        out[i] = prev;
    }
    out
}

pub(crate) fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Synthetic 15-minute bars from closes for tests.
///
/// open = previous close, high/low = ±0.001 around the body, volume = 100.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar::new(
                base + chrono::Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 0.001,
                open.min(close) - 0.001,
                close,
                100.0,
            )
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
