//! PriceBar: the unit of replayed market data.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar at a single wall-clock timestamp.
///
/// Bars are immutable once loaded. A series is ordered ascending by `time`
/// with unique timestamps; the loader enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        time: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }
}

/// Index of the bar whose timestamp equals `time`, if any.
///
/// `bars` must be sorted ascending by time.
pub fn position_of(bars: &[PriceBar], time: NaiveDateTime) -> Option<usize> {
    bars.binary_search_by(|b| b.time.cmp(&time)).ok()
}

/// The trailing slice of at most `len` bars ending at (and including) `end`.
pub fn trailing_window(bars: &[PriceBar], end: usize, len: usize) -> &[PriceBar] {
    if bars.is_empty() || len == 0 {
        return &[];
    }
    let end = end.min(bars.len() - 1);
    let start = (end + 1).saturating_sub(len);
    &bars[start..=end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 12)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn sample_bar() -> PriceBar {
        PriceBar::new(at(7, 30), 1.2500, 1.2540, 1.2490, 1.2520, 1_250.0)
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 1.2400; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn position_of_finds_exact_timestamp_only() {
        let bars: Vec<PriceBar> = (0..4)
            .map(|i| {
                let mut b = sample_bar();
                b.time = at(7, 30) + chrono::Duration::minutes(15 * i);
                b
            })
            .collect();
        assert_eq!(position_of(&bars, at(8, 0)), Some(2));
        assert_eq!(position_of(&bars, at(8, 5)), None);
    }

    #[test]
    fn trailing_window_clamps_at_series_start() {
        let bars: Vec<PriceBar> = (0..10)
            .map(|i| {
                let mut b = sample_bar();
                b.time = at(0, 0) + chrono::Duration::minutes(i);
                b
            })
            .collect();
        assert_eq!(trailing_window(&bars, 9, 4).len(), 4);
        assert_eq!(trailing_window(&bars, 9, 4)[0].time, bars[6].time);
        assert_eq!(trailing_window(&bars, 2, 50).len(), 3);
        assert!(trailing_window(&bars, 2, 0).is_empty());
        assert!(trailing_window(&[], 0, 5).is_empty());
    }
}
