//! HTTP collector for Climalink - REST delivery and registration
//!
//! ## Overview
//!
//! Talks to the Climalink collector API with a blocking `ureq` agent. One
//! request per reading, no retries: a reading the collector does not confirm
//! is the agent's to keep, and the backlog replays it on a later cycle.
//!
//! ## Status handling
//!
//! | Request            | Answer                     | Result                       |
//! |--------------------|----------------------------|------------------------------|
//! | `POST /readings`   | `201`                      | `Delivered`                  |
//! | `POST /readings`   | any other status           | `Rejected("status N")`       |
//! | `POST /readings`   | no answer / timeout        | `TransportFailed`            |
//! | `POST /sensors`    | `201` + `{id, api_key}`    | identity issued and stored   |
//! | `POST /sensors`    | anything else              | `IdentityError`              |
//!
//! `200` and `202` are deliberately not treated as confirmation.
//!
//! ## Example Usage
//!
//! ```no_run
//! use climalink_connectors::http::{HttpCollector, HttpConfig};
//! use climalink_core::{DeliveryPort, IdentityProvider, Reading};
//!
//! let config = HttpConfig::new("http://192.168.1.20:3000")
//!     .credentials_path("credentials.json");
//! let mut collector = HttpCollector::new(config)?;
//!
//! if !collector.has_identity() {
//!     collector.acquire_identity("attic", "Kharkiv")?;
//! }
//! let result = collector.deliver(&Reading::new(21.5, 48.0, 0));
//! println!("{}", result);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::PathBuf;
use std::time::Duration;

use climalink_core::constants::time::DEFAULT_REQUEST_TIMEOUT_SECS;
use climalink_core::{
    DeliveryPort, DeliveryResult, Identity, IdentityError, IdentityProvider, Reading,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::{key_hint, CredentialStore, Credentials};
use crate::{ConnectionStats, ConnectorError};

/// Status the collector answers with when it stored something
pub const HTTP_CREATED: u16 = 201;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server answered with a status other than `201`
    #[error("Server answered {status}: {message}")]
    Status { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<HttpError> for IdentityError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(msg) => IdentityError::Unreachable(msg),
            other => IdentityError::Refused(other.to_string()),
        }
    }
}

/// HTTP configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for the API, without trailing slash
    pub base_url: String,
    /// Registration endpoint
    pub register_path: String,
    /// Reading endpoint
    pub readings_path: String,
    /// Timeout for each request
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Where issued credentials are kept, `None` keeps them in memory only
    pub credentials_path: Option<PathBuf>,
}

impl HttpConfig {
    /// Create new configuration with base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            register_path: "/sensors".into(),
            readings_path: "/readings".into(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: format!("Climalink/{}", env!("CARGO_PKG_VERSION")),
            credentials_path: None,
        }
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Override the registration endpoint
    pub fn register_path(mut self, path: impl Into<String>) -> Self {
        self.register_path = path.into();
        self
    }

    /// Override the reading endpoint
    pub fn readings_path(mut self, path: impl Into<String>) -> Self {
        self.readings_path = path.into();
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Keep issued credentials in this file
    pub fn credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Reject settings the collector cannot work with
    pub fn check(&self) -> Result<(), ConnectorError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConnectorError::ConfigError(
                "Base URL must start with http:// or https://".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConnectorError::ConfigError("Timeout must be positive".into()));
        }
        for path in [&self.register_path, &self.readings_path] {
            if !path.starts_with('/') {
                return Err(ConnectorError::ConfigError(format!(
                    "Endpoint '{}' must start with '/'",
                    path
                )));
            }
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct RegistrationRequest<'a> {
    name: &'a str,
    location: &'a str,
}

#[derive(Deserialize)]
struct RegistrationResponse {
    id: serde_json::Value,
    api_key: String,
}

#[derive(Serialize)]
struct ReadingPayload {
    temperature: f32,
    humidity: f32,
    pressure: f32,
}

impl From<&Reading> for ReadingPayload {
    fn from(reading: &Reading) -> Self {
        Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
        }
    }
}

/// Map a delivery answer to its outcome. Only `201` confirms.
pub fn classify_status(status: u16) -> DeliveryResult {
    if status == HTTP_CREATED {
        DeliveryResult::Delivered
    } else {
        DeliveryResult::Rejected(format!("status {}", status))
    }
}

/// Collector client using lightweight ureq agent
pub struct HttpCollector {
    config: HttpConfig,
    agent: ureq::Agent,
    store: Option<CredentialStore>,
    credentials: Option<Credentials>,
    stats: ConnectionStats,
}

impl HttpCollector {
    /// Create a collector client, picking up stored credentials if any
    pub fn new(config: HttpConfig) -> Result<Self, ConnectorError> {
        config.check()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        let store = config.credentials_path.clone().map(CredentialStore::new);
        let credentials = match &store {
            Some(store) => store.load()?,
            None => None,
        };
        if let Some(credentials) = &credentials {
            log::info!(
                "loaded credentials for sensor {} (key {}...)",
                credentials.sensor_id,
                credentials.key_hint()
            );
        }

        Ok(Self {
            config,
            agent,
            store,
            credentials,
            stats: ConnectionStats::default(),
        })
    }

    /// Use credentials obtained elsewhere
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials).filter(Credentials::is_complete);
        self
    }

    /// Current configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Credentials in use, if registered
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Request counters
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    fn post(&self, path: &str, api_key: Option<&str>, body: &str) -> Result<u16, HttpError> {
        let mut request = self
            .agent
            .post(&self.config.url(path))
            .set("Content-Type", "application/json")
            .set("Accept", "application/json");
        if let Some(key) = api_key {
            request = request.set("x-api-key", key);
        }

        match request.send_string(body) {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(err)) => Err(HttpError::Request(err.to_string())),
        }
    }

    fn register(&self, name: &str, location: &str) -> Result<Credentials, HttpError> {
        let body = serde_json::to_string(&RegistrationRequest { name, location })
            .map_err(|e| HttpError::Serialization(e.to_string()))?;

        let url = self.config.url(&self.config.register_path);
        let response = match self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(HttpError::Status {
                    status,
                    message: response.into_string().unwrap_or_default(),
                })
            }
            Err(ureq::Error::Transport(err)) => return Err(HttpError::Request(err.to_string())),
        };

        let status = response.status();
        if status != HTTP_CREATED {
            return Err(HttpError::Status {
                status,
                message: response.into_string().unwrap_or_default(),
            });
        }

        let text = response
            .into_string()
            .map_err(|e| HttpError::Request(e.to_string()))?;
        let issued: RegistrationResponse =
            serde_json::from_str(&text).map_err(|e| HttpError::Serialization(e.to_string()))?;

        let sensor_id = match issued.id {
            serde_json::Value::String(id) => id,
            serde_json::Value::Number(id) => id.to_string(),
            other => {
                return Err(HttpError::Serialization(format!(
                    "unexpected sensor id {}",
                    other
                )))
            }
        };
        let credentials = Credentials {
            sensor_id,
            api_key: issued.api_key,
            name: name.to_string(),
            location: location.to_string(),
        };
        if !credentials.is_complete() {
            return Err(HttpError::Serialization(
                "registration answer without id or key".into(),
            ));
        }
        Ok(credentials)
    }
}

impl DeliveryPort for HttpCollector {
    fn deliver(&mut self, reading: &Reading) -> DeliveryResult {
        let api_key = match &self.credentials {
            Some(credentials) => credentials.api_key.clone(),
            None => {
                self.stats.record_failure("not registered");
                return DeliveryResult::Rejected("not registered".into());
            }
        };

        let body = match serde_json::to_string(&ReadingPayload::from(reading)) {
            Ok(body) => body,
            Err(err) => {
                self.stats.record_failure(err.to_string());
                return DeliveryResult::Rejected(format!("unencodable reading: {}", err));
            }
        };

        let result = match self.post(&self.config.readings_path, Some(&api_key), &body) {
            Ok(status) => classify_status(status),
            Err(err) => DeliveryResult::TransportFailed(err.to_string()),
        };

        match &result {
            DeliveryResult::Delivered => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += body.len() as u64;
            }
            DeliveryResult::Rejected(reason) | DeliveryResult::TransportFailed(reason) => {
                log::warn!("collector did not confirm reading: {}", reason);
                self.stats.record_failure(reason.clone());
            }
        }
        result
    }
}

impl IdentityProvider for HttpCollector {
    fn has_identity(&self) -> bool {
        self.credentials.is_some()
    }

    fn acquire_identity(&mut self, name: &str, location: &str) -> Result<Identity, IdentityError> {
        log::info!("registering sensor '{}' at '{}'", name, location);
        let credentials = self.register(name, location).map_err(|err| {
            log::warn!("registration failed: {}", err);
            self.stats.last_error = Some(err.to_string());
            IdentityError::from(err)
        })?;

        self.stats.registrations += 1;
        log::info!(
            "sensor registered, id {} (key {}...)",
            credentials.sensor_id,
            key_hint(&credentials.api_key)
        );
        let identity = credentials.identity();
        self.credentials = Some(credentials.clone());

        // Kept in memory either way, so this process does not register twice
        if let Some(store) = &self.store {
            store.save(&credentials).map_err(|err| {
                log::error!("cannot store credentials at {}: {}", store.path().display(), err);
                IdentityError::Storage(err.to_string())
            })?;
        }
        Ok(identity)
    }
}
