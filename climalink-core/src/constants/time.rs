//! Time-Related Constants
//!
//! Intervals and conversion factors for the agent loop.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

// ===== SCHEDULING =====

/// Default period between two sampling cycles (seconds).
///
/// Three minutes in the reference deployment.
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 3 * SECONDS_PER_MINUTE;

/// Default timeout for one delivery or registration request (seconds).
///
/// A stuck request blocks the whole cycle, this bounds how long.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
