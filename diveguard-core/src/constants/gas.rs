//! Gas and Setpoint Table Dimensions
//!
//! The gas table holds slot 0 (the manually entered "extra" gas), the open
//! circuit gases and the diluents. The layout is shared with the transport
//! to the sensing controller and must not change.
//!
//! ```text
//! index:  0      1 ..= 5        6 ..= 10
//!         extra  open circuit   diluents
//! ```

/// Number of open circuit gases (and of diluents).
pub const NUM_GASES: usize = 5;

/// Index offset of the diluent range inside the gas table.
///
/// Diluent `n` (1-based) lives at `NUM_OFFSET_DILUENT + n`.
pub const NUM_OFFSET_DILUENT: usize = 5;

/// Total gas table length: extra slot + open circuit + diluents.
pub const GAS_TABLE_LEN: usize = 1 + 2 * NUM_GASES;

/// Setpoint table length: unused slot 0 + one setpoint per gas.
pub const SETPOINT_TABLE_LEN: usize = 1 + NUM_GASES;

/// Index of the extra (manually entered) gas.
pub const EXTRA_GAS_ID: u8 = 0;

/// Highest valid gas index.
pub const MAX_GAS_ID: u8 = (GAS_TABLE_LEN - 1) as u8;

/// Highest valid setpoint index.
pub const MAX_SETPOINT_ID: u8 = (SETPOINT_TABLE_LEN - 1) as u8;

/// Auto-setpoint slot used near the surface.
pub const SETPOINT_ID_AUTO_LOW: u8 = 1;

/// Auto-setpoint slot used at depth.
pub const SETPOINT_ID_AUTO_HIGH: u8 = 2;

/// Auto-setpoint slot used during decompression.
pub const SETPOINT_ID_AUTO_DECO: u8 = 3;

/// Number of galvanic O2 cells on the loop.
pub const NUM_O2_SENSORS: usize = 3;

/// Oxygen share of air (%).
pub const AIR_OXYGEN_PERCENT: u8 = 21;
