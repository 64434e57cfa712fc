//! Operator commands typed into a replay session.
//!
//! One command per line:
//!
//! ```text
//! long | short | close
//! time <YYYY-MM-DD HH:MM>
//! step [n]
//! auto on|off
//! status
//! export [path]
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::data_loader::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Long,
    Short,
    Close,
    SetTime(NaiveDateTime),
    Step(usize),
    Auto(bool),
    Status,
    Export(Option<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try: long, short, close, time, step, auto, status, export)")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("cannot parse time '{0}', expected YYYY-MM-DD HH:MM")]
    InvalidTime(String),
    #[error("invalid step count '{0}'")]
    InvalidCount(String),
    #[error("expected 'on' or 'off', got '{0}'")]
    InvalidToggle(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "long" | "buy" => Ok(Command::Long),
            "short" | "sell" => Ok(Command::Short),
            "close" => Ok(Command::Close),
            "status" => Ok(Command::Status),
            "time" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("time"));
                }
                parse_timestamp(rest)
                    .map(Command::SetTime)
                    .ok_or_else(|| CommandError::InvalidTime(rest.to_string()))
            }
            "step" => {
                if rest.is_empty() {
                    return Ok(Command::Step(1));
                }
                rest.parse::<usize>()
                    .map(Command::Step)
                    .map_err(|_| CommandError::InvalidCount(rest.to_string()))
            }
            "auto" => match rest.to_ascii_lowercase().as_str() {
                "on" => Ok(Command::Auto(true)),
                "off" => Ok(Command::Auto(false)),
                "" => Err(CommandError::MissingArgument("auto")),
                other => Err(CommandError::InvalidToggle(other.to_string())),
            },
            "export" => Ok(Command::Export(
                (!rest.is_empty()).then(|| PathBuf::from(rest)),
            )),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_trade_commands() {
        assert_eq!("long".parse(), Ok(Command::Long));
        assert_eq!(" SHORT ".parse(), Ok(Command::Short));
        assert_eq!("close".parse(), Ok(Command::Close));
        assert_eq!("status".parse(), Ok(Command::Status));
    }

    #[test]
    fn parses_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 11, 12)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();
        assert_eq!("time 2024-11-12 07:30".parse(), Ok(Command::SetTime(expected)));
        assert_eq!(
            "time tomorrow".parse::<Command>(),
            Err(CommandError::InvalidTime("tomorrow".into()))
        );
        assert_eq!(
            "time".parse::<Command>(),
            Err(CommandError::MissingArgument("time"))
        );
    }

    #[test]
    fn step_defaults_to_one() {
        assert_eq!("step".parse(), Ok(Command::Step(1)));
        assert_eq!("step 20".parse(), Ok(Command::Step(20)));
        assert!(matches!(
            "step -3".parse::<Command>(),
            Err(CommandError::InvalidCount(_))
        ));
    }

    #[test]
    fn auto_toggle() {
        assert_eq!("auto on".parse(), Ok(Command::Auto(true)));
        assert_eq!("auto OFF".parse(), Ok(Command::Auto(false)));
        assert_eq!(
            "auto maybe".parse::<Command>(),
            Err(CommandError::InvalidToggle("maybe".into()))
        );
    }

    #[test]
    fn export_path_is_optional() {
        assert_eq!("export".parse(), Ok(Command::Export(None)));
        assert_eq!(
            "export out/trades.json".parse(),
            Ok(Command::Export(Some(PathBuf::from("out/trades.json"))))
        );
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "yolo".parse::<Command>(),
            Err(CommandError::Unknown("yolo".into()))
        );
    }
}
