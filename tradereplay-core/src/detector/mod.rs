//! Peak/valley signal detection over a window of closes.
//!
//! The window's closes are min–max scaled to `[0, 1]` (scaling is local to the
//! call), peaks of the scaled series become `Sell`, peaks of the negated series
//! (valleys) become `Buy`, and everything else is `Neutral`.
//!
//! Detection is pure: the same window and parameters always give the same
//! classification. It never looks past the end of the window it is given.

pub mod peaks;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceBar, Signal};

pub use peaks::find_peaks;

/// Why a window could not be classified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("window is empty")]
    EmptyWindow,

    #[error("window has a non-finite close at index {index}")]
    InvalidWindow { index: usize },
}

/// Detector thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Minimum index spacing between two peaks (or two valleys).
    pub min_distance: usize,
    /// Minimum prominence on the scaled `[0, 1]` series.
    pub min_prominence: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            min_distance: 5,
            min_prominence: 0.1,
        }
    }
}

/// Output of [`detect`]: either the last bar's signal or the whole column.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Latest(Signal),
    Series(Vec<Signal>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDetector {
    params: DetectorParams,
}

impl SignalDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> DetectorParams {
        self.params
    }

    /// Classify every bar of the window, reporting unusable windows.
    pub fn try_classify(&self, window: &[PriceBar]) -> Result<Vec<Signal>, SignalError> {
        if window.is_empty() {
            return Err(SignalError::EmptyWindow);
        }
        if let Some(index) = window.iter().position(|b| !b.close.is_finite()) {
            return Err(SignalError::InvalidWindow { index });
        }

        let mut signals = vec![Signal::Neutral; window.len()];
        let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
        let Some(scaled) = min_max_scale(&closes) else {
            return Ok(signals);
        };

        let negated: Vec<f64> = scaled.iter().map(|v| -v).collect();
        let DetectorParams {
            min_distance,
            min_prominence,
        } = self.params;

        // Valleys first so a peak on the same index overwrites it.
        for i in find_peaks(&negated, min_distance, min_prominence) {
            signals[i] = Signal::Buy;
        }
        for i in find_peaks(&scaled, min_distance, min_prominence) {
            signals[i] = Signal::Sell;
        }
        Ok(signals)
    }

    /// Classify every bar; empty or invalid windows degrade to all-neutral.
    pub fn classify(&self, window: &[PriceBar]) -> Vec<Signal> {
        match self.try_classify(window) {
            Ok(signals) => signals,
            Err(_) => vec![Signal::Neutral; window.len()],
        }
    }

    /// Signal of the final bar of the window.
    pub fn latest(&self, window: &[PriceBar]) -> Signal {
        self.classify(window).last().copied().unwrap_or_default()
    }
}

/// One-shot detection with explicit thresholds.
pub fn detect(
    window: &[PriceBar],
    min_distance: usize,
    min_prominence: f64,
    latest_only: bool,
) -> Detection {
    let detector = SignalDetector::new(DetectorParams {
        min_distance,
        min_prominence,
    });
    if latest_only {
        Detection::Latest(detector.latest(window))
    } else {
        Detection::Series(detector.classify(window))
    }
}

/// Like [`detect`] over the whole window, but reports unusable windows.
pub fn try_detect(
    window: &[PriceBar],
    min_distance: usize,
    min_prominence: f64,
) -> Result<Vec<Signal>, SignalError> {
    SignalDetector::new(DetectorParams {
        min_distance,
        min_prominence,
    })
    .try_classify(window)
}

/// Scale to `[0, 1]`. `None` for fewer than two values or a zero range.
fn min_max_scale(values: &[f64]) -> Option<Vec<f64>> {
    if values.len() < 2 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 {
        return None;
    }
    Some(values.iter().map(|v| (v - min) / range).collect())
}
