//! Sensor Limits and Validation Thresholds
//!
//! Limits for the DHT/BME-class temperature and humidity sensors the agent
//! samples. These are sanity filters for the device class, not physical truth.

// ===== RANGE LIMITS =====

/// Lowest accepted temperature (°C), inclusive.
pub const TEMP_MIN_C: f32 = -50.0;

/// Highest accepted temperature (°C), inclusive.
pub const TEMP_MAX_C: f32 = 100.0;

/// Lowest accepted relative humidity (%), inclusive.
pub const HUMIDITY_MIN_PCT: f32 = 0.0;

/// Highest accepted relative humidity (%), inclusive.
pub const HUMIDITY_MAX_PCT: f32 = 100.0;

// ===== DEVIATION LIMITS =====

/// Largest temperature jump from the last delivered reading (°C).
///
/// Larger jumps are treated as single-sample glitches. Genuine fast
/// transients get rejected too.
pub const MAX_TEMP_DEVIATION_C: f32 = 5.0;

/// Largest humidity jump from the last delivered reading (%RH).
pub const MAX_HUMIDITY_DEVIATION_PCT: f32 = 10.0;

/// Both channels closer than this to the last delivered reading count as a
/// repeat and are not sent.
pub const DUPLICATE_EPSILON: f32 = 0.1;

// ===== DEFAULTS =====

/// Pressure reported when the sensor has no barometer (hPa).
pub const DEFAULT_PRESSURE_HPA: f32 = 0.0;
