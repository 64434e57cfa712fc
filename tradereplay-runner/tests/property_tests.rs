//! Property tests for the replay plumbing.
//!
//! Uses proptest to verify:
//! 1. The clock never moves to or past its end time
//! 2. Loaded series are strictly ascending whatever the file order
//! 3. The command parser never panics on arbitrary input

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use tradereplay_runner::data_loader::canonicalize;
use tradereplay_runner::{Command, ReplayClock, Tick};
use tradereplay_core::domain::PriceBar;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 12)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

proptest! {
    #[test]
    fn clock_stays_before_end(
        increment in 1..120_i64,
        span in 1..5_000_i64,
        steps in 0..500_usize,
    ) {
        let end = base() + chrono::Duration::minutes(span);
        let mut clock = ReplayClock::new(base(), Some(end), increment);
        let mut last = clock.current();

        for _ in 0..steps {
            match clock.advance() {
                Tick::Advanced(t) => {
                    prop_assert!(t < end);
                    prop_assert_eq!(t - last, chrono::Duration::minutes(increment));
                    last = t;
                }
                Tick::EndReached => {
                    prop_assert_eq!(clock.current(), last);
                    prop_assert!(clock.is_finished());
                }
            }
        }
    }

    #[test]
    fn canonicalized_series_is_strictly_ascending(
        offsets in prop::collection::vec(0..200_i64, 0..100),
    ) {
        let bars: Vec<PriceBar> = offsets
            .iter()
            .map(|&m| {
                let t = base() + chrono::Duration::minutes(15 * m);
                PriceBar::new(t, 1.0, 1.0, 1.0, 1.0, 0.0)
            })
            .collect();
        let total = bars.len();

        let (clean, dropped) = canonicalize(bars);
        prop_assert_eq!(clean.len() + dropped, total);
        prop_assert!(clean.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn command_parser_is_total(line in ".{0,40}") {
        let _ = line.parse::<Command>();
    }
}
