//! Simulated position: one side, one entry, at most one exit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// A simulated position.
///
/// Created open by [`Position::open`]; [`Position::close`] consumes the open
/// value and returns the closed one, so a position is closed exactly once and
/// can never be re-opened. The exit fields are `Some` iff the status is
/// `Closed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    status: PositionStatus,
    exit_time: Option<NaiveDateTime>,
    exit_price: Option<f64>,
    realized_pnl: Option<f64>,
}

impl Position {
    pub fn open(side: Side, entry_time: NaiveDateTime, entry_price: f64) -> Self {
        Self {
            side,
            entry_time,
            entry_price,
            status: PositionStatus::Open,
            exit_time: None,
            exit_price: None,
            realized_pnl: None,
        }
    }

    /// Close at `exit_price`, fixing the realized P&L.
    ///
    /// Long: `exit - entry`. Short: `entry - exit`. Closing an already closed
    /// position returns it unchanged.
    pub fn close(self, exit_time: NaiveDateTime, exit_price: f64) -> Self {
        if self.status == PositionStatus::Closed {
            return self;
        }
        let pnl = self.pnl_at(exit_price);
        Self {
            status: PositionStatus::Closed,
            exit_time: Some(exit_time),
            exit_price: Some(exit_price),
            realized_pnl: Some(pnl),
            ..self
        }
    }

    /// Mark-to-market P&L if the position were closed at `price`.
    pub fn pnl_at(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => price - self.entry_price,
            Side::Short => self.entry_price - price,
        }
    }

    pub fn status(&self) -> PositionStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn exit_time(&self) -> Option<NaiveDateTime> {
        self.exit_time
    }

    pub fn exit_price(&self) -> Option<f64> {
        self.exit_price
    }

    pub fn realized_pnl(&self) -> Option<f64> {
        self.realized_pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 12)
            .unwrap()
            .and_hms_opt(8, min, 0)
            .unwrap()
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn long_pnl_is_exit_minus_entry() {
        let closed = Position::open(Side::Long, t(0), 1.2500).close(t(15), 1.2550);
        assert_eq!(closed.status(), PositionStatus::Closed);
        approx(closed.realized_pnl().unwrap(), 0.0050);
        assert_eq!(closed.exit_time(), Some(t(15)));
    }

    #[test]
    fn short_pnl_is_entry_minus_exit() {
        let closed = Position::open(Side::Short, t(0), 1.2500).close(t(15), 1.2480);
        approx(closed.realized_pnl().unwrap(), 0.0020);
    }

    #[test]
    fn open_position_has_no_exit_fields() {
        let pos = Position::open(Side::Long, t(0), 1.0);
        assert!(pos.is_open());
        assert!(pos.exit_time().is_none());
        assert!(pos.exit_price().is_none());
        assert!(pos.realized_pnl().is_none());
    }

    #[test]
    fn closing_twice_keeps_first_exit() {
        let closed = Position::open(Side::Long, t(0), 1.0).close(t(15), 2.0);
        let again = closed.clone().close(t(30), 5.0);
        assert_eq!(closed, again);
    }

    #[test]
    fn json_shape() {
        let closed = Position::open(Side::Short, t(0), 1.25).close(t(15), 1.2);
        let json = serde_json::to_value(&closed).unwrap();
        assert_eq!(json["side"], "short");
        assert_eq!(json["status"], "Closed");
        assert_eq!(json["entry_time"], "2024-11-12T08:00:00");
        let back: Position = serde_json::from_value(json).unwrap();
        assert_eq!(back, closed);
    }

    #[test]
    fn opposite_side() {
        assert_eq!(Side::Long.opposite(), Side::Short);
        assert_eq!(Side::Short.to_string(), "short");
    }
}
