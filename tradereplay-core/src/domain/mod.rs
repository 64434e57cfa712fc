//! Domain types for trade replay

pub mod bar;
pub mod ledger;
pub mod position;
pub mod signal;

pub use bar::{position_of, trailing_window, PriceBar};
pub use ledger::{Ledger, LedgerSummary};
pub use position::{Position, PositionStatus, Side};
pub use signal::Signal;
