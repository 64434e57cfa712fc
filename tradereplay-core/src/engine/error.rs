use chrono::NaiveDateTime;
use thiserror::Error;

/// Failures of a single engine call. None of them leave partial state behind:
/// the call is aborted before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no bar at {time}: no close price to trade at")]
    MissingPrice { time: NaiveDateTime },

    #[error("simulated clock is not set")]
    ClockNotSet,
}
