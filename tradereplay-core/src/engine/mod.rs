//! Trade engine: detector → decision → position state machine.
//!
//! - [`decide`] is the pure decision stage over a window's signal column
//! - [`TradeEngine`] owns the live position, the ledger and the clock
//! - [`TradeEvent`] reports every transition for the caller to log

pub mod decision;
pub mod error;
pub mod events;
pub mod trade_engine;

pub use decision::{decide, AutoTradeParams, Decision, HoldReason};
pub use error::EngineError;
pub use events::TradeEvent;
pub use trade_engine::{AutoTradeOutcome, TradeEngine};
