//! Auto-trade decision: the second, pure stage after signal detection.
//!
//! Given the window's signal column, the simulated clock, the entry time of
//! the last trade and the side currently held, pick what the engine should do.
//! Nothing here touches engine state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::detector::DetectorParams;
use crate::domain::{PriceBar, Side, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoTradeParams {
    /// Maximum bar distance between a signal and the window's last bar.
    pub furthest_index: usize,
    #[serde(flatten)]
    pub detector: DetectorParams,
}

impl Default for AutoTradeParams {
    fn default() -> Self {
        Self {
            furthest_index: 100,
            detector: DetectorParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HoldReason {
    /// No Buy/Sell bar after the last trade's entry.
    NoSignal,
    /// Latest signal is more than `furthest_index` bars old.
    Stale { index_difference: usize },
    /// The open position already matches the signal.
    AlreadyPositioned(Side),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Hold(HoldReason),
    /// Close whatever is open (if anything), then open `side`.
    Enter {
        side: Side,
        signal: Signal,
        signal_index: usize,
    },
    /// Close the open position on a stale opposite signal without re-entering.
    Exit {
        signal: Signal,
        signal_index: usize,
        index_difference: usize,
    },
}

/// Decide on the most recent actionable signal since the last trade.
///
/// An opposite position is always closed; re-entry on the signal's side needs
/// the signal to be within `furthest_index` bars of the window's end.
///
/// Candidates are bars with `time` in `(last_trade_time, current_time]`, or
/// `<= current_time` when nothing was ever traded. Neutral bars are skipped.
/// `signals` is the window's classification, index-aligned with `window`.
pub fn decide(
    window: &[PriceBar],
    signals: &[Signal],
    current_time: NaiveDateTime,
    last_trade_time: Option<NaiveDateTime>,
    live_side: Option<Side>,
    furthest_index: usize,
) -> Decision {
    let candidate = window
        .iter()
        .zip(signals)
        .enumerate()
        .rev()
        .filter(|(_, (bar, _))| {
            bar.time <= current_time && last_trade_time.map_or(true, |last| bar.time > last)
        })
        .find_map(|(i, (_, signal))| signal.implied_side().map(|side| (i, *signal, side)));

    let Some((signal_index, signal, side)) = candidate else {
        return Decision::Hold(HoldReason::NoSignal);
    };

    if live_side == Some(side) {
        return Decision::Hold(HoldReason::AlreadyPositioned(side));
    }

    let index_difference = window.len() - 1 - signal_index;
    if index_difference > furthest_index {
        return match live_side {
            Some(_) => Decision::Exit {
                signal,
                signal_index,
                index_difference,
            },
            None => Decision::Hold(HoldReason::Stale { index_difference }),
        };
    }

    Decision::Enter {
        side,
        signal,
        signal_index,
    }
}
