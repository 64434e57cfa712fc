//! Relative Strength Index.
//!
//! Gains and losses of consecutive closes are smoothed with an unadjusted
//! exponential mean, `alpha = 1 / period`, seeded at the first bar (whose
//! change counts as zero). RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: 1. Edge cases: avg_loss == 0 → 100; avg_gain == 0 → 0; both → 50.

use super::{closes, ewm, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes = closes(bars);
        let n = closes.len();
        if n == 0 {
            return Vec::new();
        }

        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let change = closes[i] - closes[i - 1];
            if change.is_nan() {
                gains[i] = f64::NAN;
                losses[i] = f64::NAN;
            } else if change > 0.0 {
                gains[i] = change;
            } else {
                losses[i] = -change;
            }
        }

        let alpha = 1.0 / self.period as f64;
        let avg_gain = ewm(&gains, alpha);
        let avg_loss = ewm(&losses, alpha);

        let mut result: Vec<f64> = avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| compute_rsi(g, l))
            .collect();
        result[0] = f64::NAN;
        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let result = Rsi::new(3).compute(&make_bars(&[1.0, 1.1, 1.2, 1.3, 1.4]));
        assert!(result[0].is_nan());
        assert_approx(result[4], 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let result = Rsi::new(3).compute(&make_bars(&[1.4, 1.3, 1.2, 1.1]));
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_reference_value() {
        // period 2 → alpha 0.5
        // changes: 0, +1, -1
        // avg_gain: 0, 0.5, 0.25 ; avg_loss: 0, 0, 0.5
        // rsi[2] = 100 - 100 / (1 + 0.25 / 0.5) = 33.333...
        let result = Rsi::new(2).compute(&make_bars(&[10.0, 11.0, 10.0]));
        assert_approx(result[1], 100.0, 1e-9);
        assert_approx(result[2], 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let result = Rsi::default().compute(&make_bars(&[
            1.0, 1.05, 0.98, 1.10, 0.95, 1.15, 0.90, 1.20,
        ]));
        for (i, &v) in result.iter().enumerate().skip(1) {
            assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
        }
    }

    #[test]
    fn rsi_empty() {
        assert!(Rsi::default().compute(&[]).is_empty());
    }
}
