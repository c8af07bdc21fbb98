//! Warning Thresholds and Clamping Bounds

/// Deepest depth the core accepts (m). Deeper readings are clamped.
pub const MAX_DEPTH_M: f32 = 255.0;

/// Battery charge below which the low battery warning fires (%).
///
/// A charge of exactly zero means "unknown" and never warns.
pub const LOW_BATTERY_PERCENT: f32 = 10.0;

/// Number of tissue compartments in the decompression model.
pub const NUM_COMPARTMENTS: usize = 16;

/// Lowest plausible O2 cell reading (bar).
pub const O2_SENSOR_MIN_BAR: f32 = 0.1;

/// Highest plausible O2 cell reading (bar).
pub const O2_SENSOR_MAX_BAR: f32 = 2.5;

/// Default CO2 alarm level (ppm).
pub const CO2_ALARM_PPM: u16 = 5000;

/// Default CNS warning level (%).
pub const CNS_WARNING_PERCENT: u8 = 90;
