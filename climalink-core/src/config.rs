//! Agent configuration
//!
//! Loaded from a JSON document. Every field has a default, so a minimal file
//! only names the sensor:
//!
//! ```json
//! {
//!   "sensor_name": "greenhouse-north",
//!   "sensor_location": "Kharkiv",
//!   "sample_interval_secs": 180,
//!   "limits": { "max_temp_deviation": 6.0 }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::constants::time::DEFAULT_SAMPLE_INTERVAL_SECS;
use crate::validators::ValidationLimits;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Cannot read config: {0}")]
    Io(io::Error),

    /// The document is not valid JSON for this schema
    #[error("Cannot parse config: {0}")]
    Parse(serde_json::Error),

    /// A value is out of its allowed range
    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

/// Settings for one agent process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Seconds between sampling cycles
    pub sample_interval_secs: u64,
    /// JSON Lines file holding undelivered readings
    pub backlog_path: PathBuf,
    /// JSON file holding the last delivered reading
    pub baseline_path: PathBuf,
    /// Name sent when registering with the collector
    pub sensor_name: String,
    /// Location sent when registering with the collector
    pub sensor_location: String,
    /// Validation thresholds
    pub limits: ValidationLimits,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: DEFAULT_SAMPLE_INTERVAL_SECS,
            backlog_path: PathBuf::from("climalink/backlog.jsonl"),
            baseline_path: PathBuf::from("climalink/baseline.json"),
            sensor_name: String::from("climalink-sensor"),
            sensor_location: String::from("unknown"),
            limits: ValidationLimits::default(),
        }
    }
}

impl AgentConfig {
    /// Parse and check a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Load and check a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Period between sampling cycles
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    /// Reject settings the agent cannot run with
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.sample_interval_secs == 0 {
            return Err(ConfigError::Invalid("sample_interval_secs must be positive"));
        }
        if self.sensor_name.trim().is_empty() {
            return Err(ConfigError::Invalid("sensor_name must not be empty"));
        }
        if self.sensor_location.trim().is_empty() {
            return Err(ConfigError::Invalid("sensor_location must not be empty"));
        }
        if self.backlog_path == self.baseline_path {
            return Err(ConfigError::Invalid("backlog_path and baseline_path must differ"));
        }
        self.limits.check().map_err(ConfigError::Invalid)
    }
}
