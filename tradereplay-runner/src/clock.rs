//! Simulated replay clock.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Longest supported step: one week.
pub const MAX_INCREMENT_MINUTES: i64 = 7 * 24 * 60;

/// Step length for `increment_minutes`, clamped to `1..=MAX_INCREMENT_MINUTES`.
pub fn step_duration(increment_minutes: i64) -> Duration {
    Duration::minutes(increment_minutes.clamp(1, MAX_INCREMENT_MINUTES))
}

/// Result of moving the clock one increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tick {
    Advanced(NaiveDateTime),
    /// The next step would land at or past the end; the clock did not move.
    EndReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayClock {
    current: NaiveDateTime,
    end: Option<NaiveDateTime>,
    increment: Duration,
}

impl ReplayClock {
    /// `increment_minutes` is clamped to `1..=MAX_INCREMENT_MINUTES`.
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>, increment_minutes: i64) -> Self {
        Self {
            current: start,
            end,
            increment: step_duration(increment_minutes),
        }
    }

    pub fn current(&self) -> NaiveDateTime {
        self.current
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn increment(&self) -> Duration {
        self.increment
    }

    /// Jump to `time`. Jumping past the end is allowed; the next
    /// [`advance`](Self::advance) then reports the end.
    pub fn set(&mut self, time: NaiveDateTime) {
        self.current = time;
    }

    pub fn advance(&mut self) -> Tick {
        let next = increment_time(self.current, self.increment);
        match self.end {
            Some(end) if next >= end => Tick::EndReached,
            _ => {
                self.current = next;
                Tick::Advanced(next)
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end
            .is_some_and(|end| increment_time(self.current, self.increment) >= end)
    }
}

pub fn increment_time(time: NaiveDateTime, by: Duration) -> NaiveDateTime {
    time + by
}
