//! Persisted replay configuration (TOML).
//!
//! Lives at `<config dir>/tradereplay/config.toml` unless a path is given
//! explicitly. Every field has a default, so partial files are accepted.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use tradereplay_core::engine::AutoTradeParams;

use crate::clock::MAX_INCREMENT_MINUTES;
use crate::session::ReplaySettings;

pub const DEFAULT_DATA_PATH: &str = "data/GBP_USD_M15.csv";
pub const DEFAULT_EXPORT_PATH: &str = "trades_history.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to start a replay session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Bar file to replay.
    pub data_path: PathBuf,
    /// Instrument label; seeds synthetic data.
    pub instrument: String,
    /// First replayed bar (inclusive). Defaults to the first bar of the file.
    pub start: Option<NaiveDateTime>,
    /// Replay stops once the clock reaches this time.
    pub end: Option<NaiveDateTime>,
    /// Clock step in minutes.
    pub increment_minutes: i64,
    /// Trailing bars fed to the detector.
    pub window_size: usize,
    pub auto_trade: bool,
    pub export_path: PathBuf,
    pub trading: AutoTradeParams,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            instrument: "GBP_USD".to_string(),
            start: None,
            end: None,
            increment_minutes: 15,
            window_size: 50,
            auto_trade: true,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            trading: AutoTradeParams::default(),
        }
    }
}

impl ReplayConfig {
    /// Parse from a TOML string and validate.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Load from `path`, falling back to defaults when the file is missing or
    /// unusable. A present-but-broken file is reported as a warning.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Write as TOML. Creates parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(io_err)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_INCREMENT_MINUTES).contains(&self.increment_minutes) {
            return Err(ConfigError::Invalid(format!(
                "increment_minutes must be between 1 and {MAX_INCREMENT_MINUTES}, got {}",
                self.increment_minutes
            )));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be at least 1".into()));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return Err(ConfigError::Invalid(format!(
                    "end ({end}) must be after start ({start})"
                )));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> ReplaySettings {
        ReplaySettings {
            window_size: self.window_size,
            auto_trade: self.auto_trade,
            params: self.trading,
            export_path: self.export_path.clone(),
        }
    }
}

/// `<config dir>/tradereplay/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tradereplay").join("config.toml"))
}
