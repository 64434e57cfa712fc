//! State transitions reported back to the caller for the operator console.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::domain::{Position, Side};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TradeEvent {
    Opened {
        side: Side,
        time: NaiveDateTime,
        price: f64,
    },
    /// Carries the closed copy that was appended to the ledger.
    Closed(Position),
    NothingToClose,
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeEvent::Opened { side, time, price } => {
                write!(f, "{side} trade opened at {price} on {time}")
            }
            TradeEvent::Closed(p) => write!(
                f,
                "{} trade closed at {} on {} with a profit/loss of {:.5} (entry {} on {})",
                p.side,
                p.exit_price().unwrap_or(f64::NAN),
                p.exit_time()
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                p.realized_pnl().unwrap_or(f64::NAN),
                p.entry_price,
                p.entry_time,
            ),
            TradeEvent::NothingToClose => f.write_str("no open trade to close"),
        }
    }
}
