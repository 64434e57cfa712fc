//! Trade Replay Runner: data loading, replay session, operator commands and export.
//!
//! This crate builds on `tradereplay-core` to provide:
//! - CSV bar loading with synthetic fallback
//! - Replay clock and session (step, run to end, auto-trade per tick)
//! - Operator command parsing
//! - Ledger and feature-table export
//! - Persisted TOML configuration

pub mod clock;
pub mod command;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod session;

pub use clock::{increment_time, step_duration, ReplayClock, Tick, MAX_INCREMENT_MINUTES};
pub use command::{Command, CommandError};
pub use config::{default_config_path, ConfigError, ReplayConfig};
pub use data_loader::{
    generate_synthetic_bars, load_bars, load_csv, parse_timestamp, DataSource, LoadError,
    LoadOptions, LoadedData,
};
pub use export::{
    export_ledger, features_to_csv, ledger_to_csv, ledger_to_json, write_features_csv,
    ExportError, ExportFormat, ExportOutcome, TradeRow,
};
pub use session::{ReplaySession, ReplaySettings, Reply, SessionError, SessionStatus, StepOutcome};
