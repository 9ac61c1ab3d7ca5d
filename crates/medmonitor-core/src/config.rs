//! Configuration file support for MedMonitor.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medmonitor/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::dosing::DEFAULT_DOSE_QUANTITY;
use crate::reminder::DEFAULT_POLL_INTERVAL;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub reminders: ReminderConfig,

    #[serde(default)]
    pub dosing: DosingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Reminder polling configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReminderConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl ReminderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Dose recording configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DosingConfig {
    #[serde(default = "default_quantity")]
    pub default_quantity: i64,
}

impl Default for DosingConfig {
    fn default() -> Self {
        Self {
            default_quantity: default_quantity(),
        }
    }
}

// Default value functions
fn default_db_path() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("medmonitor").join("medmonitor.db")
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_quantity() -> i64 {
    DEFAULT_DOSE_QUANTITY
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> ConfigResult<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            path => {
                tracing::info!(?path, "No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("medmonitor").join("config.toml"))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.reminders.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reminders.poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.dosing.default_quantity <= 0 {
            return Err(ConfigError::Invalid(
                "dosing.default_quantity must be positive".into(),
            ));
        }
        Ok(())
    }
}
