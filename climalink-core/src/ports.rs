//! Ports - capabilities the coordinator consumes
//!
//! The coordinator never talks to hardware or the network directly. It calls
//! these traits, and the connectors crate (or a test double) implements them:
//!
//! - [`SensorPort`]: sample the temperature/humidity sensor
//! - [`DeliveryPort`]: send one reading to the collector
//! - [`IdentityProvider`]: hold or acquire collector credentials
//! - [`LinkPort`]: network link state (WiFi on the reference device)
//!
//! All calls are blocking. A delivery that hangs blocks the whole cycle until
//! the adapter's own timeout fires; the adapter is where a timeout or
//! cancellation token belongs.

use std::fmt;

use thiserror_no_std::Error;

use crate::reading::{RawSample, Reading};

/// Error type for sensor operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Failed to read from sensor
    #[error("Sensor read failed")]
    ReadFailed,
    /// Sensor not initialized
    #[error("Sensor not initialized")]
    NotInitialized,
    /// Timeout waiting for sensor
    #[error("Sensor timed out")]
    Timeout,
}

/// Port for reading the sensor
pub trait SensorPort {
    /// Take one sample. Channels the driver could not read come back as NaN
    /// or as an error; both are treated as a sensor fault.
    fn sample(&mut self) -> Result<RawSample, SensorError>;
}

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// The collector confirmed it stored the reading
    Delivered,
    /// The collector answered but did not confirm
    Rejected(String),
    /// The request never got an answer
    TransportFailed(String),
}

impl DeliveryResult {
    /// Only a confirmed accept counts
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => f.write_str("delivered"),
            Self::Rejected(reason) => write!(f, "rejected: {}", reason),
            Self::TransportFailed(reason) => write!(f, "transport failed: {}", reason),
        }
    }
}

/// Port for sending readings to the remote collector
pub trait DeliveryPort {
    /// Attempt one delivery. `Delivered` must mean the collector confirmed it.
    fn deliver(&mut self, reading: &Reading) -> DeliveryResult;
}

/// Credentials the collector issued for this sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Sensor id assigned by the collector
    pub sensor_id: String,
    /// API key sent with every reading
    pub api_key: String,
}

/// Error type for identity acquisition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Could not reach the collector
    #[error("Registration unreachable: {0}")]
    Unreachable(String),
    /// The collector answered without issuing credentials
    #[error("Registration refused: {0}")]
    Refused(String),
    /// Credentials were issued but could not be kept
    #[error("Credential storage failed: {0}")]
    Storage(String),
}

/// Port for collector credentials
pub trait IdentityProvider {
    /// Whether credentials are held
    fn has_identity(&self) -> bool;

    /// Register under `name`/`location` and keep the issued credentials
    fn acquire_identity(&mut self, name: &str, location: &str) -> Result<Identity, IdentityError>;
}

/// Port for network link state
pub trait LinkPort {
    /// Whether the link is up right now
    fn is_up(&self) -> bool;

    /// Try to bring the link up, returns the new state
    fn reconnect(&mut self) -> bool;
}

/// Link that is always up (wired hosts, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConnected;

impl LinkPort for AlwaysConnected {
    fn is_up(&self) -> bool {
        true
    }

    fn reconnect(&mut self) -> bool {
        true
    }
}
