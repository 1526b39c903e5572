//! Engine configuration with validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a fan-out may wait for subsystem replies (default: 10000ms)
    pub reply_timeout_ms: u64,
    /// How often the sweeper looks for overdue fan-outs (default: 500ms)
    pub sweep_interval_ms: u64,
    /// Upper bound on concurrently pending fan-outs (default: 1000)
    pub max_pending_fan_outs: usize,
    /// File storage configuration
    pub storage: StorageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 10_000,
            sweep_interval_ms: 500,
            max_pending_fan_outs: 1000,
            storage: StorageConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reply_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "reply_timeout_ms cannot be 0".into(),
            ));
        }

        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "sweep_interval_ms cannot be 0".into(),
            ));
        }

        if self.max_pending_fan_outs == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_pending_fan_outs cannot be 0".into(),
            ));
        }

        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStorage(
                "storage root cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Defaults overridden by environment variables.
    ///
    /// - `VL_REPLY_TIMEOUT_MS`
    /// - `VL_SWEEP_INTERVAL_MS`
    /// - `VL_MAX_PENDING_FAN_OUTS`
    /// - `VL_STORAGE_ROOT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = env_parse("VL_REPLY_TIMEOUT_MS")? {
            config.reply_timeout_ms = v;
        }
        if let Some(v) = env_parse("VL_SWEEP_INTERVAL_MS")? {
            config.sweep_interval_ms = v;
        }
        if let Some(v) = env_parse("VL_MAX_PENDING_FAN_OUTS")? {
            config.max_pending_fan_outs = v;
        }
        if let Ok(root) = env::var("VL_STORAGE_ROOT") {
            config.storage.root = PathBuf::from(root);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(format!("{name}={raw}"))),
        Err(_) => Ok(None),
    }
}

/// File storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per application
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./app_storage"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid limit value
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid storage settings
    #[error("invalid storage configuration: {0}")]
    InvalidStorage(String),
    /// Environment value that does not parse
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
