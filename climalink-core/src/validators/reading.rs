//! Reading validator with range, deviation and duplicate checks

use crate::{
    constants::sensors::{
        DUPLICATE_EPSILON, HUMIDITY_MAX_PCT, HUMIDITY_MIN_PCT, MAX_HUMIDITY_DEVIATION_PCT,
        MAX_TEMP_DEVIATION_C, TEMP_MAX_C, TEMP_MIN_C,
    },
    errors::{Channel, Rejection, ValidationResult},
    reading::{Baseline, Reading},
    traits::{Validatable, Validator},
};

use super::utils;

/// Thresholds used by [`ReadingValidator`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValidationLimits {
    /// Lowest accepted temperature (°C)
    pub temp_min: f32,
    /// Highest accepted temperature (°C)
    pub temp_max: f32,
    /// Lowest accepted humidity (%)
    pub humidity_min: f32,
    /// Highest accepted humidity (%)
    pub humidity_max: f32,
    /// Largest temperature jump from the baseline (°C)
    pub max_temp_deviation: f32,
    /// Largest humidity jump from the baseline (%RH)
    pub max_humidity_deviation: f32,
    /// Below this on both channels a reading is a repeat
    pub duplicate_epsilon: f32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            temp_min: TEMP_MIN_C,
            temp_max: TEMP_MAX_C,
            humidity_min: HUMIDITY_MIN_PCT,
            humidity_max: HUMIDITY_MAX_PCT,
            max_temp_deviation: MAX_TEMP_DEVIATION_C,
            max_humidity_deviation: MAX_HUMIDITY_DEVIATION_PCT,
            duplicate_epsilon: DUPLICATE_EPSILON,
        }
    }
}

impl ValidationLimits {
    /// Reject limit sets that cannot accept anything sensible
    pub fn check(&self) -> Result<(), &'static str> {
        let all = [
            self.temp_min,
            self.temp_max,
            self.humidity_min,
            self.humidity_max,
            self.max_temp_deviation,
            self.max_humidity_deviation,
            self.duplicate_epsilon,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err("limits must be finite numbers");
        }
        if self.temp_min > self.temp_max {
            return Err("temp_min is above temp_max");
        }
        if self.humidity_min > self.humidity_max {
            return Err("humidity_min is above humidity_max");
        }
        if self.max_temp_deviation <= 0.0 || self.max_humidity_deviation <= 0.0 {
            return Err("deviation limits must be positive");
        }
        if self.duplicate_epsilon < 0.0 {
            return Err("duplicate_epsilon must not be negative");
        }
        Ok(())
    }
}

/// Validator for combined temperature/humidity readings
#[derive(Debug, Clone, Default)]
pub struct ReadingValidator {
    limits: ValidationLimits,
}

impl ReadingValidator {
    /// Create validator with custom limits
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Limits in use
    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }
}

impl Validator for ReadingValidator {
    type Value = Reading;
    type Output = Reading;

    fn validate(&self, reading: &Reading, baseline: &Baseline) -> ValidationResult<Reading> {
        let limits = &self.limits;

        // Pressure has to serialize as a number too
        if !reading.temperature.is_valid()
            || !reading.humidity.is_valid()
            || !reading.pressure.is_finite()
        {
            return Err(Rejection::SensorFault);
        }

        utils::check_range(
            Channel::Temperature,
            reading.temperature,
            limits.temp_min,
            limits.temp_max,
        )?;
        utils::check_range(
            Channel::Humidity,
            reading.humidity,
            limits.humidity_min,
            limits.humidity_max,
        )?;

        // Bootstrap: nothing delivered yet, nothing to compare against
        let Some(last) = baseline.last() else {
            return Ok(*reading);
        };

        let temp_delta = utils::deviation(reading.temperature, last.temperature);
        let humidity_delta = utils::deviation(reading.humidity, last.humidity);

        utils::check_deviation(Channel::Temperature, temp_delta, limits.max_temp_deviation)?;
        utils::check_deviation(
            Channel::Humidity,
            humidity_delta,
            limits.max_humidity_deviation,
        )?;

        if temp_delta < limits.duplicate_epsilon && humidity_delta < limits.duplicate_epsilon {
            return Err(Rejection::DuplicateOfLast);
        }

        Ok(*reading)
    }
}
