//! MACD signal line.
//!
//! EMA(short) - EMA(long) of closes, smoothed again by EMA(signal). Every EMA
//! is unadjusted with `alpha = 2 / (span + 1)` and seeded at the first bar, so
//! there is no NaN warmup.

use super::{closes, ewm, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Macd {
    short: usize,
    long: usize,
    signal: usize,
    name: String,
}

impl Macd {
    pub fn new(short: usize, long: usize, signal: usize) -> Self {
        assert!(short >= 1 && long >= 1 && signal >= 1, "MACD spans must be >= 1");
        Self {
            short,
            long,
            signal,
            name: format!("macd_{short}_{long}_{signal}"),
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes = closes(bars);
        let short = ewm(&closes, span_alpha(self.short));
        let long = ewm(&closes, span_alpha(self.long));
        let line: Vec<f64> = short.iter().zip(&long).map(|(s, l)| s - l).collect();
        ewm(&line, span_alpha(self.signal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn flat_series_is_zero() {
        let result = Macd::default().compute(&make_bars(&[1.25; 30]));
        assert!(result.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn reference_value() {
        // spans 1/3/1: short EMA = close, long alpha 0.5, signal = line
        // closes 1, 3 → long: 1, 2 → line: 0, 1
        let result = Macd::new(1, 3, 1).compute(&make_bars(&[1.0, 3.0]));
        assert_approx(result[0], 0.0, 1e-12);
        assert_approx(result[1], 1.0, 1e-12);
    }

    #[test]
    fn rising_series_is_positive() {
        let closes: Vec<f64> = (0..40).map(|i| 1.0 + i as f64 * 0.01).collect();
        let result = Macd::default().compute(&make_bars(&closes));
        assert!(result[39] > 0.0);
        assert_eq!(Macd::default().name(), "macd_12_26_9");
    }
}
