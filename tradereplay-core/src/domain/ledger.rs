//! Ledger: append-only record of closed positions.

use serde::{Deserialize, Serialize};

use super::position::Position;

/// Closed positions in close order.
///
/// The only mutation is [`Ledger::record`], which appends. Entries are never
/// edited or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    trades: Vec<Position>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a closed position. Open positions are not ledger material and
    /// are ignored; the return value says whether the entry was appended.
    pub(crate) fn record(&mut self, closed: Position) -> bool {
        if closed.is_open() {
            return false;
        }
        self.trades.push(closed);
        true
    }

    pub fn trades(&self) -> &[Position] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn last(&self) -> Option<&Position> {
        self.trades.last()
    }

    pub fn summary(&self) -> LedgerSummary {
        let pnls: Vec<f64> = self.trades.iter().filter_map(|t| t.realized_pnl()).collect();
        let winners = pnls.iter().filter(|p| **p > 0.0).count();
        let losers = pnls.iter().filter(|p| **p < 0.0).count();
        LedgerSummary {
            trade_count: pnls.len(),
            total_pnl: pnls.iter().sum(),
            winners,
            losers,
            win_rate: if pnls.is_empty() {
                0.0
            } else {
                winners as f64 / pnls.len() as f64
            },
        }
    }
}

/// Aggregate view of the ledger for status lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub trade_count: usize,
    pub total_pnl: f64,
    pub winners: usize,
    pub losers: usize,
    pub win_rate: f64,
}
