//! Gas and setpoint configuration tables
//!
//! Plain in-memory shapes of the configured gases and setpoints. The packed
//! "note" bitfields of the persisted format become booleans here; packing is
//! the transport's business.

use crate::constants::gas::{NUM_GASES, NUM_OFFSET_DILUENT};

/// Index into the gas table (see [`crate::constants::gas`] for the layout)
pub type GasId = u8;

/// Dive mode the computer is operating in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DiveMode {
    /// Open circuit
    #[default]
    Oc = 0,
    /// Closed circuit rebreather
    Ccr = 1,
    /// Depth gauge only
    Gauge = 2,
    /// Breath hold
    Apnea = 3,
    /// Passive semi-closed rebreather
    Pscr = 4,
}

impl DiveMode {
    /// Closed or passive loop: setpoints and diluents apply
    pub const fn is_loop(&self) -> bool {
        matches!(self, DiveMode::Ccr | DiveMode::Pscr)
    }
}

/// How the loop ppO2 is obtained in CCR/PSCR mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CcrMode {
    /// ppO2 from the O2 cells
    Sensors = 0,
    /// ppO2 assumed equal to the selected setpoint
    #[default]
    FixedSetpoint = 1,
    /// ppO2 simulated from the PSCR drop model
    SimPpo2 = 2,
}

/// Decompression algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecoAlgorithm {
    /// Bühlmann with gradient factors
    #[default]
    Gf,
    /// Varying permeability model
    Vpm,
}

/// Standard and alternative decompression algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoType {
    /// Algorithm used for the dive
    pub standard: DecoAlgorithm,
    /// Algorithm offered as the alternative plan
    pub alternative: DecoAlgorithm,
}

impl DecoType {
    /// Algorithm driving the current dive
    pub const fn active(&self) -> DecoAlgorithm {
        self.standard
    }

    /// Whether VPM drives the current dive
    pub fn is_vpm(&self) -> bool {
        self.standard == DecoAlgorithm::Vpm
    }
}

/// Per-gas flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GasNote {
    /// Gas is carried on this dive
    pub active: bool,
    /// Gas the dive starts on
    pub first: bool,
    /// Gas is used for decompression
    pub deco: bool,
    /// Gas is used while travelling to depth
    pub travel: bool,
    /// Gas was switched off mid-dive
    pub off: bool,
}

/// One configured gas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GasSlot {
    /// Oxygen share (%)
    pub oxygen_percent: u8,
    /// Helium share (%)
    pub helium_percent: u8,
    /// Deco switch depth (m)
    pub depth_m: u8,
    /// Travel switch depth (m)
    pub travel_depth_m: u8,
    /// Flags
    pub note: GasNote,
    /// Cylinder size (l)
    pub bottle_size_l: u8,
}

impl GasSlot {
    /// Active gas with the given mix
    pub const fn new(oxygen_percent: u8, helium_percent: u8) -> Self {
        Self {
            oxygen_percent,
            helium_percent,
            depth_m: 0,
            travel_depth_m: 0,
            note: GasNote { active: true, first: false, deco: false, travel: false, off: false },
            bottle_size_l: 0,
        }
    }

    /// Mark as the starting gas
    pub const fn first(mut self) -> Self {
        self.note.first = true;
        self
    }

    /// Mark as deco gas switched to at `depth_m`
    pub const fn deco_at(mut self, depth_m: u8) -> Self {
        self.note.deco = true;
        self.depth_m = depth_m;
        self
    }

    /// Mark as travel gas switched to at `depth_m`
    pub const fn travel_at(mut self, depth_m: u8) -> Self {
        self.note.travel = true;
        self.travel_depth_m = depth_m;
        self
    }

    /// Nitrogen share (%) as the complement of oxygen and helium
    pub fn nitrogen_percent(&self) -> u8 {
        100u8
            .saturating_sub(self.oxygen_percent)
            .saturating_sub(self.helium_percent)
    }

    /// Active and not switched off
    pub fn is_usable(&self) -> bool {
        self.note.active && !self.note.off
    }

    /// Maximum operating depth (m) at the given ppO2 ceiling
    pub fn mod_m(&self, ppo2_max_cbar: u8) -> f32 {
        if self.oxygen_percent == 0 {
            return crate::constants::limits::MAX_DEPTH_M;
        }
        let depth = (ppo2_max_cbar as f32 / self.oxygen_percent as f32 - 1.0) * 10.0;
        depth.clamp(0.0, crate::constants::limits::MAX_DEPTH_M)
    }

    /// Same breathing mix as `other`
    pub fn same_mix(&self, other: &GasSlot) -> bool {
        self.oxygen_percent == other.oxygen_percent && self.helium_percent == other.helium_percent
    }
}

/// Per-setpoint flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetpointNote {
    /// Setpoint may be selected
    pub active: bool,
    /// Setpoint the dive starts on
    pub first: bool,
}

/// One configured setpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetpointSlot {
    /// Target ppO2 (cbar)
    pub setpoint_cbar: u8,
    /// Switch depth (m)
    pub depth_m: u8,
    /// Flags
    pub note: SetpointNote,
}

impl SetpointSlot {
    /// Active setpoint switched to at `depth_m`
    pub const fn new(setpoint_cbar: u8, depth_m: u8) -> Self {
        Self {
            setpoint_cbar,
            depth_m,
            note: SetpointNote { active: true, first: false },
        }
    }
}

/// Gas currently breathed, derived from a gas table slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActualGas {
    /// Nitrogen share (%)
    pub nitrogen_percent: u8,
    /// Helium share (%)
    pub helium_percent: u8,
    /// Setpoint (cbar), zero outside loop modes
    pub setpoint_cbar: u8,
    /// Gas table slot the mix was taken from
    pub gas_id: GasId,
    /// Dive mode the mix was applied under
    pub applied_dive_mode: DiveMode,
    /// PSCR O2 drop factor, `1 / lung_ratio * o2_drop`
    pub pscr_factor: f32,
}

impl ActualGas {
    /// Oxygen share (%) as the complement of nitrogen and helium
    pub fn oxygen_percent(&self) -> u8 {
        100u8
            .saturating_sub(self.nitrogen_percent)
            .saturating_sub(self.helium_percent)
    }
}

/// Gas id lies in the diluent range
pub fn is_diluent_id(id: GasId) -> bool {
    (id as usize) > NUM_OFFSET_DILUENT && (id as usize) <= NUM_OFFSET_DILUENT + NUM_GASES
}

/// Gas id lies in the open circuit range
pub fn is_oc_id(id: GasId) -> bool {
    id >= 1 && (id as usize) <= NUM_GASES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nitrogen_is_complement() {
        let trimix = GasSlot::new(18, 45);
        assert_eq!(trimix.nitrogen_percent(), 37);

        // Misconfigured slot never underflows
        let broken = GasSlot::new(80, 40);
        assert_eq!(broken.nitrogen_percent(), 0);
    }

    #[test]
    fn mod_of_common_gases() {
        let ean50 = GasSlot::new(50, 0);
        assert!((ean50.mod_m(160) - 22.0).abs() < 0.01);

        let oxygen = GasSlot::new(100, 0);
        assert!((oxygen.mod_m(160) - 6.0).abs() < 0.01);
    }

    #[test]
    fn id_ranges() {
        assert!(!is_oc_id(0));
        assert!(is_oc_id(1));
        assert!(is_oc_id(5));
        assert!(!is_oc_id(6));
        assert!(is_diluent_id(6));
        assert!(is_diluent_id(10));
        assert!(!is_diluent_id(11));
    }

    #[test]
    fn loop_modes() {
        assert!(DiveMode::Ccr.is_loop());
        assert!(DiveMode::Pscr.is_loop());
        assert!(!DiveMode::Oc.is_loop());
        assert!(!DiveMode::Gauge.is_loop());
    }
}
