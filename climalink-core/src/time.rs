//! Time management for edge devices
//!
//! Readings are stamped by the agent, not by the sensor driver. The clock is
//! abstracted so the loop can run on:
//! - System clock (when available)
//! - A scripted clock in tests

use core::cell::Cell;

/// Timestamp in milliseconds since epoch (or device boot for monotonic)
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Scripted time source for testing
///
/// Returns the current value, then advances by `step` milliseconds.
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Cell<Timestamp>,
    step: u64,
}

impl FixedTime {
    /// Clock that always reads `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: Cell::new(timestamp),
            step: 0,
        }
    }

    /// Advance by `step` ms after every read
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Jump to an absolute time
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.set(timestamp);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        let current = self.timestamp.get();
        self.timestamp.set(current.saturating_add(self.step));
        current
    }
}
