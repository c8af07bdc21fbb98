//! Constants for DiveGuard Core
//!
//! Centralized numeric values used by the state core. Values that the
//! decompression model or the transport depend on live here so they are not
//! duplicated as magic numbers.
//!
//! ## Organization
//!
//! - **Gas**: table dimensions and index offsets
//! - **Time**: debounce windows and integration windows
//! - **Limits**: warning thresholds and clamping bounds
//! - **Deco**: decompression geometry (stop spacing, switch margins)

/// Gas and setpoint table dimensions.
pub mod gas;

/// Debounce and integration windows.
pub mod time;

/// Warning thresholds and clamping bounds.
pub mod limits;

/// Decompression geometry.
pub mod deco;

// Re-export commonly used constants for convenience
pub use gas::{NUM_GASES, NUM_OFFSET_DILUENT, GAS_TABLE_LEN, SETPOINT_TABLE_LEN, NUM_O2_SENSORS};

pub use time::{
    BUZZER_MIN_STABLE_MS, BUZZER_MAX_ON_MS, BUZZER_REARM_IDLE_MS,
    FALLBACK_DEBOUNCE_MS, VPM_CRUSH_WINDOW_S,
};

pub use limits::{MAX_DEPTH_M, LOW_BATTERY_PERCENT, NUM_COMPARTMENTS};
