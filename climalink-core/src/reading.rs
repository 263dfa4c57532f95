//! Reading and baseline value types
//!
//! A [`RawSample`] is what the sensor driver hands back. The coordinator
//! stamps it into a [`Reading`], which is immutable from then on and is either
//! delivered or written to the backlog.
//!
//! [`Baseline`] is the last *confirmed delivered* reading. It only moves after
//! the collector accepted a reading, never on a plain sample.

use crate::constants::sensors::DEFAULT_PRESSURE_HPA;
use crate::time::Timestamp;

/// Unstamped sample straight from the sensor driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Air temperature in °C
    pub temperature: f32,
    /// Relative humidity in %
    pub humidity: f32,
    /// Barometric pressure in hPa, when the sensor has one
    pub pressure: Option<f32>,
}

impl RawSample {
    /// Temperature/humidity sample without pressure
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            pressure: None,
        }
    }

    /// Attach a pressure value
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Stamp the sample into a reading
    pub fn at(self, timestamp: Timestamp) -> Reading {
        Reading {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure.unwrap_or(DEFAULT_PRESSURE_HPA),
            timestamp,
        }
    }
}

/// One timestamped observation
///
/// Also the persisted backlog record: one JSON object per line with the
/// four numeric fields. A missing `pressure` reads back as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Air temperature in °C
    pub temperature: f32,
    /// Relative humidity in %
    pub humidity: f32,
    /// Barometric pressure in hPa, 0 when absent
    #[cfg_attr(feature = "serde", serde(default))]
    pub pressure: f32,
    /// Milliseconds, wall clock or monotonic
    pub timestamp: Timestamp,
}

impl Reading {
    /// Reading without pressure
    pub fn new(temperature: f32, humidity: f32, timestamp: Timestamp) -> Self {
        Self {
            temperature,
            humidity,
            pressure: DEFAULT_PRESSURE_HPA,
            timestamp,
        }
    }

    /// Set the pressure channel
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }
}

/// Last confirmed delivered temperature and humidity
///
/// Starts out empty ("no prior reading"). Validation compares new samples
/// against it, so it must only change after a confirmed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Baseline {
    last: Option<BaselinePoint>,
}

/// Channels of a delivered reading kept as the baseline
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaselinePoint {
    /// Temperature in °C
    pub temperature: f32,
    /// Relative humidity in %
    pub humidity: f32,
}

impl Baseline {
    /// No reading delivered yet
    pub const fn none() -> Self {
        Self { last: None }
    }

    /// Baseline taken from a delivered reading
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            last: Some(BaselinePoint {
                temperature: reading.temperature,
                humidity: reading.humidity,
            }),
        }
    }

    /// The last delivered channels, if any
    pub fn last(&self) -> Option<&BaselinePoint> {
        self.last.as_ref()
    }

    /// Whether any reading has been delivered
    pub fn is_set(&self) -> bool {
        self.last.is_some()
    }

    /// Move the baseline to a reading the collector accepted
    pub fn record_delivery(&mut self, reading: &Reading) {
        *self = Self::from_reading(reading);
    }
}
