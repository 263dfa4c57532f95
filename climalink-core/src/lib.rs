//! Core engine for the Climalink telemetry agent
//!
//! Decides whether a sampled temperature/humidity reading is worth sending,
//! and keeps readings that could not be delivered in a durable backlog that
//! is replayed on later cycles.
//!
//! Key constraints:
//! - Validation is pure and runs without `std` (ESP32-class targets)
//! - No reading that passed validation is ever dropped silently
//! - One cycle at a time, no locks
//!
//! ```no_run
//! use climalink_core::{Baseline, Reading, ReadingValidator, Rejection, Validator};
//!
//! let validator = ReadingValidator::default();
//! let baseline = Baseline::from_reading(&Reading::new(20.0, 50.0, 1_000));
//!
//! match validator.validate(&Reading::new(21.0, 55.0, 2_000), &baseline) {
//!     Ok(_reading) => {}, // Worth sending
//!     Err(Rejection::DuplicateOfLast) => {}, // Nothing new to report
//!     Err(_) => {}, // Glitch or fault, discard
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod errors;
pub mod reading;
pub mod time;
pub mod traits;
pub mod validators;

#[cfg(feature = "std")]
pub mod backlog;
#[cfg(feature = "std")]
pub mod baseline;
#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod coordinator;
#[cfg(feature = "std")]
pub mod ports;

// Public API
pub use errors::{Channel, Rejection, ValidationOutcome, ValidationResult};
pub use reading::{Baseline, RawSample, Reading};
pub use traits::{Validatable, Validator};
pub use validators::{ReadingValidator, ValidationLimits};

#[cfg(feature = "std")]
pub use backlog::{BacklogEntry, DurableLog, FileBacklog, FlushReport, MemoryBacklog};
#[cfg(feature = "std")]
pub use baseline::BaselineFile;
#[cfg(feature = "std")]
pub use config::AgentConfig;
#[cfg(feature = "std")]
pub use coordinator::{CoordinatorStats, CycleOutcome, CyclePhase, ReplayCoordinator};
#[cfg(feature = "std")]
pub use ports::{
    AlwaysConnected, DeliveryPort, DeliveryResult, Identity, IdentityError, IdentityProvider,
    LinkPort, SensorError, SensorPort,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
