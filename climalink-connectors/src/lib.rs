//! Collector connectors for the Climalink agent
//!
//! ## Overview
//!
//! The core crate only knows the collector through two capabilities:
//! delivering a reading (`DeliveryPort`) and obtaining credentials
//! (`IdentityProvider`). This crate implements both against the Climalink
//! REST collector.
//!
//! ### HTTP collector
//!
//! - `POST /sensors` with the sensor name and location registers the sensor.
//!   Only `201 Created` with an id and an API key counts as registered.
//! - `POST /readings` with the `x-api-key` header delivers one reading. Only
//!   `201 Created` counts as delivered. Any other answer leaves the reading
//!   in the agent's backlog.
//! - Issued credentials are kept in a small JSON file so a restart does not
//!   register the sensor again.
//!
//! ## Security Considerations
//!
//! - The API key is never logged in full, only its first 4 characters
//! - Use `https://` outside of a lab network
//!
//! ## Example Usage
//!
//! ```no_run
//! use climalink_connectors::http::{HttpCollector, HttpConfig};
//! use climalink_core::{AgentConfig, ReplayCoordinator};
//! # use climalink_core::{RawSample, SensorError, SensorPort};
//! # struct Dht22;
//! # impl SensorPort for Dht22 {
//! #     fn sample(&mut self) -> Result<RawSample, SensorError> { Ok(RawSample::new(21.0, 48.0)) }
//! # }
//!
//! let config = HttpConfig::new("https://collector.example.com")
//!     .credentials_path("climalink/credentials.json")
//!     .timeout_secs(10);
//! let collector = HttpCollector::new(config)?;
//!
//! let mut agent = ReplayCoordinator::from_config(&AgentConfig::default(), Dht22, collector);
//! agent.run_cycle();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod credentials;

#[cfg(feature = "http")]
pub mod http;

// Re-export common types
pub use credentials::{CredentialError, CredentialStore, Credentials};
#[cfg(feature = "http")]
pub use http::{HttpCollector, HttpConfig, HttpError};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Settings the connector cannot work with
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Stored credentials could not be read
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Readings the collector confirmed
    pub messages_sent: u64,
    /// Readings the collector refused or never saw
    pub messages_failed: u64,
    /// Total request body bytes of confirmed readings
    pub bytes_sent: u64,
    /// Successful registrations
    pub registrations: u32,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    pub(crate) fn record_failure(&mut self, error: impl Into<String>) {
        self.messages_failed += 1;
        self.last_error = Some(error.into());
    }
}
