//! Error Types for Reading Rejection
//!
//! ## Design Philosophy
//!
//! Rejections come out of the validation hot path and are logged, counted and
//! then dropped together with the sample. They are kept small:
//!
//! 1. **No Heap Allocation**: every variant is inline data, so the validator
//!    works on targets without an allocator.
//!
//! 2. **Copy Semantics**: a rejection can be logged and stored in stats
//!    without cloning.
//!
//! ## Categories
//!
//! ### Sensor Faults
//! - `SensorFault`: a channel is not a number, the sensor could not be read
//!
//! ### Not Worth Sending
//! - `OutOfRange`: outside the device-class limits
//! - `AnomalousDeviation`: jumped too far from the last delivered reading
//! - `DuplicateOfLast`: practically identical to the last delivered reading
//!
//! None of these are buffered. Buffering is reserved for readings that passed
//! validation but could not be delivered.
//!
//! ```rust
//! use climalink_core::{Baseline, Reading, ReadingValidator, Rejection, Validator};
//!
//! let validator = ReadingValidator::default();
//! match validator.validate(&Reading::new(f32::NAN, 40.0, 0), &Baseline::none()) {
//!     Err(Rejection::SensorFault) => {
//!         // check wiring, skip this cycle
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use core::fmt;

use thiserror_no_std::Error;

use crate::reading::Reading;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, Rejection>;

/// Outcome of validating one sample: the accepted reading or why it was dropped
pub type ValidationOutcome = ValidationResult<Reading>;

/// Measurement channel a rejection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Air temperature in °C
    Temperature,
    /// Relative humidity in %
    Humidity,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => f.write_str("temperature"),
            Self::Humidity => f.write_str("humidity"),
        }
    }
}

/// Reasons a sample is not sent
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// A channel is not a number, or the sensor did not answer
    #[error("Sensor fault: unreadable sample")]
    SensorFault,

    /// Value outside the device-class limits
    #[error("{channel} {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// Channel that failed the range check
        channel: Channel,
        /// The sampled value
        value: f32,
        /// Lower bound, inclusive
        min: f32,
        /// Upper bound, inclusive
        max: f32,
    },

    /// Jump from the last delivered reading larger than the allowed deviation
    #[error("{channel} moved {delta} from last delivered, limit {limit}")]
    AnomalousDeviation {
        /// Channel that jumped
        channel: Channel,
        /// Absolute difference to the baseline
        delta: f32,
        /// Maximum allowed difference
        limit: f32,
    },

    /// Both channels within the duplicate epsilon of the last delivered reading
    #[error("Duplicate of last delivered reading")]
    DuplicateOfLast,
}

impl Rejection {
    /// Short label used in logs and stats
    pub fn label(&self) -> &'static str {
        match self {
            Self::SensorFault => "sensor_fault",
            Self::OutOfRange { .. } => "out_of_range",
            Self::AnomalousDeviation { .. } => "anomalous_deviation",
            Self::DuplicateOfLast => "duplicate_of_last",
        }
    }
}
