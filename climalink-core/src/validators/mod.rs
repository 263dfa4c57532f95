//! Reading Validators
//!
//! ## Overview
//!
//! Decides whether a sampled reading is worth sending. The checks run in a
//! fixed order and the first failing one wins:
//!
//! ### 1. Sensor Fault
//! A channel that is not a number means the driver could not read the sensor.
//!
//! ### 2. Range
//! Device-class limits, inclusive:
//! - Temperature: -50°C to 100°C
//! - Humidity: 0% to 100%
//!
//! A range failure is reported regardless of the baseline.
//!
//! ### 3. Deviation
//! Only once something has been delivered. A jump of more than 5°C or 10%RH
//! from the last delivered reading is treated as a single-sample glitch.
//! This also drops genuine fast transients; that trade-off is accepted.
//!
//! ### 4. Duplicate
//! Both channels within 0.1 of the last delivered reading carry no new
//! information and are not sent.
//!
//! ## Usage Example
//!
//! ```rust
//! use climalink_core::{Baseline, Reading, ReadingValidator, Validator};
//!
//! let validator = ReadingValidator::default();
//!
//! // Nothing delivered yet: any in-range reading is accepted
//! let first = validator.validate(&Reading::new(20.0, 50.0, 0), &Baseline::none())?;
//!
//! // Afterwards the last delivered reading is the reference
//! let baseline = Baseline::from_reading(&first);
//! validator.validate(&Reading::new(21.0, 55.0, 180_000), &baseline)?;
//! # Ok::<(), climalink_core::Rejection>(())
//! ```
//!
//! ## Customization
//!
//! ```rust
//! use climalink_core::validators::{ReadingValidator, ValidationLimits};
//!
//! // Greenhouse: never below freezing, tolerate faster swings
//! let greenhouse = ReadingValidator::new(ValidationLimits {
//!     temp_min: 0.0,
//!     max_temp_deviation: 8.0,
//!     ..ValidationLimits::default()
//! });
//! ```

mod reading;
mod utils;

pub use reading::{ReadingValidator, ValidationLimits};
