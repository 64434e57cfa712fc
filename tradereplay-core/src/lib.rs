//! Trade replay core: domain types, peak/valley signal detector, indicators
//! and the single-position trade engine.
//!
//! Nothing in this crate does I/O or logging. Every operation returns its
//! result (or a typed error) and the caller decides how to report it:
//! - Domain types (bars, signals, positions, ledger)
//! - Signal detector over min–max scaled closes
//! - Auto-trade decision function and trade engine
//! - Feature indicators (SMA, RSI, MACD, stochastic)

pub mod detector;
pub mod domain;
pub mod engine;
pub mod indicators;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types can move to a driver thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Ledger>();
        require_sync::<domain::Ledger>();
        require_send::<detector::SignalDetector>();
        require_sync::<detector::SignalDetector>();
        require_send::<engine::TradeEngine>();
        require_sync::<engine::TradeEngine>();
        require_send::<engine::TradeEvent>();
        require_sync::<engine::TradeEvent>();
        require_send::<indicators::FeatureTable>();
        require_sync::<indicators::FeatureTable>();
    }

    /// Architecture contract: the decision stage sees signals, never the engine.
    ///
    /// `decide` takes the window, its signal column, the clock, the last entry
    /// time and the live side by value. If it ever needs `&TradeEngine`, this
    /// stops compiling.
    #[test]
    fn decide_is_independent_of_engine_state() {
        fn _check(
            window: &[domain::PriceBar],
            signals: &[domain::Signal],
            now: chrono::NaiveDateTime,
        ) -> engine::Decision {
            engine::decide(window, signals, now, None, None, 100)
        }
    }
}
