//! Constants for Climalink Core
//!
//! Numeric limits and defaults used by the validator and the agent loop,
//! kept in one place with their units in the name.
//!
//! ## Organization
//!
//! - **Sensors**: device-class limits and validation thresholds
//! - **Time**: unit conversions and scheduling defaults

/// Sensor limits and validation thresholds.
pub mod sensors;

/// Time-related constants for intervals and timeouts.
pub mod time;
