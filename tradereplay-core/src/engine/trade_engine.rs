//! Single-position trade engine.
//!
//! Owns the live position slot, the ledger and the simulated clock. All
//! mutation goes through `&mut self`, one call at a time; there is no shared
//! state to lock.
//!
//! Prices come from the bar table the caller passes in: a trade at time `t` is
//! filled at the close of the bar stamped `t`. If there is no such bar the call
//! fails with [`EngineError::MissingPrice`] before anything changes.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::decision::{decide, AutoTradeParams, Decision};
use super::error::EngineError;
use super::events::TradeEvent;
use crate::detector::SignalDetector;
use crate::domain::{position_of, Ledger, Position, PriceBar, Side, Signal};

#[derive(Debug, Clone, Default)]
pub struct TradeEngine {
    live: Option<Position>,
    ledger: Ledger,
    current_time: Option<NaiveDateTime>,
    /// Entry time of the most recent trade ever opened, open or closed.
    last_entry_time: Option<NaiveDateTime>,
}

/// What one `auto_trade` call saw and did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoTradeOutcome {
    /// Signal of the bar at the current time, if the window holds that bar.
    pub current_signal: Option<Signal>,
    pub decision: Decision,
    pub events: Vec<TradeEvent>,
}

impl TradeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_position(&self) -> Option<&Position> {
        self.live.as_ref()
    }

    pub fn live_side(&self) -> Option<Side> {
        self.live.as_ref().map(|p| p.side)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn current_time(&self) -> Option<NaiveDateTime> {
        self.current_time
    }

    pub fn last_entry_time(&self) -> Option<NaiveDateTime> {
        self.last_entry_time
    }

    pub fn set_current_time(&mut self, time: NaiveDateTime) {
        self.current_time = Some(time);
    }

    pub fn open_long(&mut self, prices: &[PriceBar]) -> Result<Vec<TradeEvent>, EngineError> {
        self.open(Side::Long, prices)
    }

    pub fn open_short(&mut self, prices: &[PriceBar]) -> Result<Vec<TradeEvent>, EngineError> {
        self.open(Side::Short, prices)
    }

    /// Open `side` at the current time's close.
    ///
    /// An open position is closed first at the same time and price, so opens
    /// never stack. Returns the close event (if any) followed by the open.
    pub fn open(
        &mut self,
        side: Side,
        prices: &[PriceBar],
    ) -> Result<Vec<TradeEvent>, EngineError> {
        let time = self.current_time.ok_or(EngineError::ClockNotSet)?;
        let price = close_at(prices, time)?;

        let mut events = Vec::with_capacity(2);
        if let Some(closed) = self.close_live(time, price) {
            events.push(closed);
        }

        self.live = Some(Position::open(side, time, price));
        self.last_entry_time = Some(time);
        events.push(TradeEvent::Opened { side, time, price });
        Ok(events)
    }

    /// Close the live position at the current time's close.
    ///
    /// With nothing open this is a no-op reported as
    /// [`TradeEvent::NothingToClose`], even when no price is available.
    pub fn close(&mut self, prices: &[PriceBar]) -> Result<TradeEvent, EngineError> {
        if self.live.is_none() {
            return Ok(TradeEvent::NothingToClose);
        }
        let time = self.current_time.ok_or(EngineError::ClockNotSet)?;
        let price = close_at(prices, time)?;
        Ok(self
            .close_live(time, price)
            .unwrap_or(TradeEvent::NothingToClose))
    }

    fn close_live(&mut self, time: NaiveDateTime, price: f64) -> Option<TradeEvent> {
        let closed = self.live.take()?.close(time, price);
        self.ledger.record(closed.clone());
        Some(TradeEvent::Closed(closed))
    }

    /// Detect signals over `window`, decide, and act at `current_time`.
    ///
    /// `window` is typically the trailing bars up to and including the bar at
    /// `current_time`; it is also the price table for any fill. The clock is
    /// moved to `current_time` even when the call fails.
    pub fn auto_trade(
        &mut self,
        window: &[PriceBar],
        current_time: NaiveDateTime,
        params: &AutoTradeParams,
    ) -> Result<AutoTradeOutcome, EngineError> {
        self.current_time = Some(current_time);

        let signals = SignalDetector::new(params.detector).classify(window);
        let current_signal = position_of(window, current_time).map(|i| signals[i]);

        let decision = decide(
            window,
            &signals,
            current_time,
            self.last_entry_time,
            self.live_side(),
            params.furthest_index,
        );
        let events = self.apply(decision, window)?;

        Ok(AutoTradeOutcome {
            current_signal,
            decision,
            events,
        })
    }

    /// Carry out a decision made by [`decide`].
    pub fn apply(
        &mut self,
        decision: Decision,
        prices: &[PriceBar],
    ) -> Result<Vec<TradeEvent>, EngineError> {
        match decision {
            Decision::Hold(_) => Ok(Vec::new()),
            Decision::Enter { side, .. } => self.open(side, prices),
            Decision::Exit { .. } => Ok(vec![self.close(prices)?]),
        }
    }
}

fn close_at(prices: &[PriceBar], time: NaiveDateTime) -> Result<f64, EngineError> {
    position_of(prices, time)
        .map(|i| prices[i].close)
        .filter(|p| p.is_finite())
        .ok_or(EngineError::MissingPrice { time })
}
