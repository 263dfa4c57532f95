//! Common Validation Utilities
//!
//! Pure helpers shared by the reading validator. No side effects and no
//! allocation, so they are safe to call from anywhere.
//!
//! ### Range Validation
//! ```rust,ignore
//! check_range(Channel::Temperature, temp, -50.0, 100.0)?;
//! ```
//!
//! ### Deviation Validation
//! Compares against the last *delivered* value, not the last sample:
//! ```rust,ignore
//! let delta = deviation(new_temp, baseline.temperature);
//! ```

use crate::errors::{Channel, Rejection, ValidationResult};

/// Check that a value lies within `[min, max]`, bounds inclusive
pub fn check_range(channel: Channel, value: f32, min: f32, max: f32) -> ValidationResult<()> {
    if value < min || value > max {
        Err(Rejection::OutOfRange {
            channel,
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

/// Absolute difference between a sample and its baseline value
pub fn deviation(current: f32, previous: f32) -> f32 {
    libm::fabsf(current - previous)
}

/// Reject a jump larger than `limit`
pub fn check_deviation(channel: Channel, delta: f32, limit: f32) -> ValidationResult<()> {
    if delta > limit {
        Err(Rejection::AnomalousDeviation {
            channel,
            delta,
            limit,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check_is_inclusive() {
        assert!(check_range(Channel::Temperature, 5.0, 0.0, 10.0).is_ok());
        assert!(check_range(Channel::Temperature, 0.0, 0.0, 10.0).is_ok());
        assert!(check_range(Channel::Temperature, 10.0, 0.0, 10.0).is_ok());
        assert!(check_range(Channel::Temperature, -1.0, 0.0, 10.0).is_err());
        assert!(check_range(Channel::Humidity, 11.0, 0.0, 10.0).is_err());
        assert!(check_range(Channel::Humidity, f32::INFINITY, 0.0, 10.0).is_err());
    }

    #[test]
    fn deviation_is_symmetric() {
        assert_eq!(deviation(26.0, 20.0), 6.0);
        assert_eq!(deviation(14.0, 20.0), 6.0);
    }

    #[test]
    fn deviation_limit_is_exclusive() {
        assert!(check_deviation(Channel::Temperature, 5.0, 5.0).is_ok());
        assert!(matches!(
            check_deviation(Channel::Temperature, 5.5, 5.0),
            Err(Rejection::AnomalousDeviation { channel: Channel::Temperature, .. })
        ));
    }
}
