//! Configuration file handling
//!
//! A single JSON object. Every key is optional:
//!
//! ```json
//! { "store_path": "./formwright.store", "debounce_ms": 300, "log_level": "info" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Upper bound for the autosave debounce window
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Store file location (default "./formwright.store")
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Builder autosave debounce window in milliseconds (default 300)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_store_path() -> String {
    "./formwright.store".to_string()
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            debounce_ms: default_debounce_ms(),
            log_level: default_log_level(),
        }
    }
}

impl FormConfig {
    /// Load configuration from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: FormConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.store_path.trim().is_empty() {
            return Err(ConfigError::Invalid("store_path must not be empty".into()));
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Invalid(format!(
                "debounce_ms must be <= {}, got {}",
                MAX_DEBOUNCE_MS, self.debounce_ms
            )));
        }

        self.severity()?;
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store_path)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }
}
