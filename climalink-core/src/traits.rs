//! Core traits for validators
//!
//! These traits define the interface validators implement.
//! Keep them simple - embedded devices don't need complex abstractions.

use crate::errors::ValidationResult;
use crate::reading::Baseline;

/// Core validator trait
///
/// Validation is a pure decision: no storage, no network, same answer for the
/// same input and baseline.
pub trait Validator {
    /// The type of value this validator handles
    type Value;

    /// What an accepted value turns into
    type Output;

    /// Validate a single sample against the last delivered baseline
    fn validate(&self, value: &Self::Value, baseline: &Baseline) -> ValidationResult<Self::Output>;
}

/// Trait for values that can be validated
pub trait Validatable {
    /// Check if the value is a usable number (not NaN)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        !self.is_nan()
    }
}
