//! Replay session: a bar series, a simulated clock and a trade engine.
//!
//! The session drives everything synchronously. `step()` moves the clock one
//! increment and, when auto-trade is on and a bar exists at the new time,
//! runs the engine's auto-trade over the trailing window ending at that bar.
//! Engine failures for a tick are logged and the tick is skipped; the replay
//! keeps going.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use tradereplay_core::detector::SignalDetector;
use tradereplay_core::domain::{
    position_of, trailing_window, LedgerSummary, Position, PriceBar, Signal,
};
use tradereplay_core::engine::{
    AutoTradeOutcome, AutoTradeParams, EngineError, TradeEngine, TradeEvent,
};

use crate::clock::{step_duration, ReplayClock, Tick};
use crate::command::Command;
use crate::config::{ReplayConfig, DEFAULT_EXPORT_PATH};
use crate::export::{export_ledger, ExportError, ExportOutcome};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no bars to replay")]
    NoBars,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySettings {
    pub window_size: usize,
    pub auto_trade: bool,
    pub params: AutoTradeParams,
    pub export_path: PathBuf,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            window_size: 50,
            auto_trade: true,
            params: AutoTradeParams::default(),
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Advanced {
        time: NaiveDateTime,
        /// Present when auto-trade ran on this tick.
        auto: Option<AutoTradeOutcome>,
    },
    EndReached,
}

/// Snapshot for the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub time: NaiveDateTime,
    pub auto_trade: bool,
    pub live: Option<Position>,
    /// Mark-to-market P&L of the live position at the current bar's close.
    pub unrealized_pnl: Option<f64>,
    pub signal: Option<Signal>,
    pub summary: LedgerSummary,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | auto {}",
            self.time,
            if self.auto_trade { "on" } else { "off" }
        )?;
        if let Some(signal) = self.signal {
            write!(f, " | signal {signal:?}")?;
        }
        match &self.live {
            Some(p) => {
                write!(f, " | {} open at {} since {}", p.side, p.entry_price, p.entry_time)?;
                if let Some(pnl) = self.unrealized_pnl {
                    write!(f, ", unrealized {pnl:.5}")?;
                }
            }
            None => f.write_str(" | flat")?,
        }
        write!(
            f,
            " | {} trades, total P&L {:.5}, win rate {:.1}%",
            self.summary.trade_count,
            self.summary.total_pnl,
            self.summary.win_rate * 100.0
        )
    }
}

/// What a command did, for echoing back to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Trade(Vec<TradeEvent>),
    TimeSet(NaiveDateTime),
    Stepped { steps: usize, finished: bool },
    Auto(bool),
    Status(SessionStatus),
    Exported(ExportOutcome),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Trade(events) => {
                let lines: Vec<String> = events.iter().map(ToString::to_string).collect();
                f.write_str(&lines.join("\n"))
            }
            Reply::TimeSet(t) => write!(f, "time set to {t}"),
            Reply::Stepped { steps, finished } => {
                write!(f, "advanced {steps} step(s)")?;
                if *finished {
                    f.write_str(", end of replay reached")?;
                }
                Ok(())
            }
            Reply::Auto(on) => write!(f, "auto-trade {}", if *on { "on" } else { "off" }),
            Reply::Status(status) => fmt::Display::fmt(status, f),
            Reply::Exported(outcome) => fmt::Display::fmt(outcome, f),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplaySession {
    bars: Vec<PriceBar>,
    clock: ReplayClock,
    engine: TradeEngine,
    settings: ReplaySettings,
}

impl ReplaySession {
    /// `bars` must be sorted ascending with unique timestamps.
    pub fn new(
        bars: Vec<PriceBar>,
        clock: ReplayClock,
        settings: ReplaySettings,
    ) -> Result<Self, SessionError> {
        if bars.is_empty() {
            return Err(SessionError::NoBars);
        }
        let mut engine = TradeEngine::new();
        engine.set_current_time(clock.current());
        Ok(Self {
            bars,
            clock,
            engine,
            settings,
        })
    }

    /// Start at the configured time (or the first bar). Without a configured
    /// end, the replay runs through the last bar.
    pub fn from_config(bars: Vec<PriceBar>, config: &ReplayConfig) -> Result<Self, SessionError> {
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(SessionError::NoBars);
        };
        let start = config.start.unwrap_or(first.time);
        let end = config
            .end
            .unwrap_or(last.time + step_duration(config.increment_minutes));
        let clock = ReplayClock::new(start, Some(end), config.increment_minutes);
        Self::new(bars, clock, config.settings())
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn clock(&self) -> &ReplayClock {
        &self.clock
    }

    pub fn engine(&self) -> &TradeEngine {
        &self.engine
    }

    pub fn settings(&self) -> &ReplaySettings {
        &self.settings
    }

    pub fn current_time(&self) -> NaiveDateTime {
        self.clock.current()
    }

    pub fn set_auto_trade(&mut self, on: bool) {
        self.settings.auto_trade = on;
        info!(auto_trade = on, "auto-trade toggled");
    }

    /// Trailing `window_size` bars up to and including the current time.
    pub fn window(&self) -> &[PriceBar] {
        let now = self.clock.current();
        match self.bars.partition_point(|b| b.time <= now) {
            0 => &[],
            n => trailing_window(&self.bars, n - 1, self.settings.window_size),
        }
    }

    pub fn step(&mut self) -> StepOutcome {
        let time = match self.clock.advance() {
            Tick::Advanced(time) => time,
            Tick::EndReached => {
                info!(time = %self.clock.current(), "end of replay reached");
                return StepOutcome::EndReached;
            }
        };
        self.engine.set_current_time(time);

        if !self.settings.auto_trade {
            return StepOutcome::Advanced { time, auto: None };
        }
        let Some(index) = position_of(&self.bars, time) else {
            debug!(%time, "no bar at this time, skipping auto-trade");
            return StepOutcome::Advanced { time, auto: None };
        };

        let window = trailing_window(&self.bars, index, self.settings.window_size);
        let auto = match self.engine.auto_trade(window, time, &self.settings.params) {
            Ok(outcome) => {
                debug!(%time, decision = ?outcome.decision, "auto-trade tick");
                log_events(&outcome.events);
                Some(outcome)
            }
            Err(e) => {
                warn!(%time, error = %e, "auto-trade failed, skipping tick");
                None
            }
        };
        StepOutcome::Advanced { time, auto }
    }

    /// Step up to `n` times. Returns the steps taken and whether the end was hit.
    pub fn step_n(&mut self, n: usize) -> (usize, bool) {
        for taken in 0..n {
            if self.step() == StepOutcome::EndReached {
                return (taken, true);
            }
        }
        (n, self.clock.is_finished())
    }

    /// Step until the clock reports the end. Returns the number of ticks.
    pub fn run_to_end(&mut self) -> usize {
        let mut ticks = 0;
        while let StepOutcome::Advanced { .. } = self.step() {
            ticks += 1;
        }
        ticks
    }

    /// Move the simulated clock (and the engine's) to `time`.
    pub fn set_time(&mut self, time: NaiveDateTime) {
        self.clock.set(time);
        self.engine.set_current_time(time);
        info!(%time, "current time set");
    }

    pub fn open_long(&mut self) -> Result<Vec<TradeEvent>, EngineError> {
        let events = self.engine.open_long(&self.bars)?;
        log_events(&events);
        Ok(events)
    }

    pub fn open_short(&mut self) -> Result<Vec<TradeEvent>, EngineError> {
        let events = self.engine.open_short(&self.bars)?;
        log_events(&events);
        Ok(events)
    }

    pub fn close(&mut self) -> Result<TradeEvent, EngineError> {
        let event = self.engine.close(&self.bars)?;
        log_events(std::slice::from_ref(&event));
        Ok(event)
    }

    pub fn status(&self) -> SessionStatus {
        let time = self.clock.current();
        let price = position_of(&self.bars, time).map(|i| self.bars[i].close);
        let live = self.engine.live_position().cloned();
        let unrealized_pnl = live.as_ref().zip(price).map(|(p, px)| p.pnl_at(px));

        let window = self.window();
        let signal = window
            .last()
            .filter(|b| b.time == time)
            .map(|_| SignalDetector::new(self.settings.params.detector).latest(window));

        SessionStatus {
            time,
            auto_trade: self.settings.auto_trade,
            live,
            unrealized_pnl,
            signal,
            summary: self.engine.ledger().summary(),
        }
    }

    /// Export the ledger to `path`, or to the configured export path.
    pub fn export(&self, path: Option<&Path>) -> Result<ExportOutcome, ExportError> {
        let path = path.unwrap_or(&self.settings.export_path);
        export_ledger(self.engine.ledger(), path)
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply, SessionError> {
        let reply = match command {
            Command::Long => Reply::Trade(self.open_long()?),
            Command::Short => Reply::Trade(self.open_short()?),
            Command::Close => Reply::Trade(vec![self.close()?]),
            Command::SetTime(time) => {
                self.set_time(time);
                Reply::TimeSet(time)
            }
            Command::Step(n) => {
                let (steps, finished) = self.step_n(n);
                Reply::Stepped { steps, finished }
            }
            Command::Auto(on) => {
                self.set_auto_trade(on);
                Reply::Auto(on)
            }
            Command::Status => Reply::Status(self.status()),
            Command::Export(path) => Reply::Exported(self.export(path.as_deref())?),
        };
        Ok(reply)
    }
}

fn log_events(events: &[TradeEvent]) {
    for event in events {
        info!("{event}");
    }
}
