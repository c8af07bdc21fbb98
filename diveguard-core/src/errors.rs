//! Error Types for the Dive State Core
//!
//! ## Design Philosophy
//!
//! Nothing in the tick path is allowed to fail. Sensor faults become warning
//! flags, out-of-range table indices are clamped, and a gas or setpoint that
//! cannot be resolved simply stays where it was. Errors therefore only exist
//! at the edges of the core:
//!
//! 1. **Checked table lookups** used by menus that want to reject a bad index
//!    instead of silently clamping it.
//! 2. **The deco lock handshake** between the tick loop and the lower
//!    frequency decompression recompute.
//!
//! Like the rest of the crate the error type is small, `Copy` and carries no
//! heap data, so it can be returned from interrupt-adjacent code.
//!
//! ```rust
//! use diveguard_core::{DiveSettings, StateError};
//!
//! let settings = DiveSettings::default();
//! match settings.gas(42) {
//!     Ok(slot) => { let _ = slot.oxygen_percent; }
//!     Err(StateError::GasIdOutOfRange { .. }) => {
//!         // Reject the menu input
//!     }
//!     Err(_) => {}
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;

/// State core errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Gas index outside the configured gas table
    #[error("Gas id {id} outside table [0, {max}]")]
    GasIdOutOfRange {
        /// Requested index
        id: u8,
        /// Largest valid index
        max: u8,
    },

    /// Setpoint index outside the configured setpoint table
    #[error("Setpoint id {id} outside table [0, {max}]")]
    SetpointIdOutOfRange {
        /// Requested index
        id: u8,
        /// Largest valid index
        max: u8,
    },

    /// Publish was requested without a running recompute
    #[error("No decompression recompute is running")]
    DecoNotRunning,
}

#[cfg(feature = "defmt")]
impl defmt::Format for StateError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::GasIdOutOfRange { id, max } =>
                defmt::write!(fmt, "Gas id {} outside [0, {}]", id, max),
            Self::SetpointIdOutOfRange { id, max } =>
                defmt::write!(fmt, "Setpoint id {} outside [0, {}]", id, max),
            Self::DecoNotRunning =>
                defmt::write!(fmt, "Deco recompute not running"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    #[test]
    fn error_display() {
        let err = StateError::GasIdOutOfRange { id: 12, max: 10 };
        assert_eq!(err.to_string(), "Gas id 12 outside table [0, 10]");

        let err = StateError::DecoNotRunning;
        assert_eq!(err.to_string(), "No decompression recompute is running");
    }

    #[test]
    fn error_is_small() {
        assert!(core::mem::size_of::<StateError>() <= 4);
    }
}
