//! Decompression Geometry

/// Distance from max depth inside which the standard ppO2 ceiling applies (m).
///
/// Once the diver has left this band the deco ceiling is used.
pub const LEFT_MAX_DEPTH_BAND_M: f32 = 3.0;

/// Margin below the current depth a deco gas switch depth must reach (m).
pub const DECO_GAS_SWITCH_MARGIN_M: f32 = 0.9;

/// Margin above the current depth a travel gas may still be selected at (m).
pub const TRAVEL_GAS_SWITCH_MARGIN_M: f32 = 0.01;

/// Band above the next stop in which the deco setpoint activates (m).
pub const DECO_SETPOINT_BAND_M: f32 = 3.0;

/// Tolerance for a missed deco stop (m).
pub const DECO_MISSED_TOLERANCE_M: f32 = 0.1;

/// Default spacing between decompression stops (m).
pub const DEFAULT_STOP_INCREMENT_M: u8 = 3;

/// Maximum number of decompression stops published per plan.
pub const DECO_MAX_STOPS: usize = 50;

/// Water vapour pressure in the lungs (bar).
pub const WATER_VAPOUR_BAR: f32 = 0.0627;

/// Metres of seawater per bar.
pub const METERS_PER_BAR: f32 = 10.0;

/// Rise in ambient pressure a crushing window must exceed (msw, bar × 10).
pub const VPM_CRUSH_MIN_RISE_MSW: f32 = 0.5;
