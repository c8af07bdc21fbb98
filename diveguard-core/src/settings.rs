//! Persisted configuration and the per-dive settings snapshot
//!
//! [`Settings`] is what the configuration provider hands over. At dive start
//! it is turned into a [`DiveSettings`] snapshot that the rest of the core
//! works from. The snapshot is frozen in shape for the whole dive; only slot
//! flags (a gas switched off, a setpoint deactivated) and the fallback state
//! change underway.

use heapless::Vec;

use crate::constants::deco::DEFAULT_STOP_INCREMENT_M;
use crate::constants::gas::{
    AIR_OXYGEN_PERCENT, GAS_TABLE_LEN, MAX_GAS_ID, MAX_SETPOINT_ID, NUM_GASES, NUM_OFFSET_DILUENT,
    SETPOINT_TABLE_LEN,
};
use crate::constants::limits::{CNS_WARNING_PERCENT, CO2_ALARM_PPM};
use crate::deco::DecoModel;
use crate::errors::{StateError, StateResult};
use crate::gas::{CcrMode, DecoType, DiveMode, GasId, GasSlot, SetpointSlot};

/// One entry of the ordered deco gas change list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoGasChange {
    /// Gas table slot switched to
    pub gas_id: GasId,
    /// Depth at which the switch happens (m)
    pub depth_m: u8,
}

/// Active deco gases ordered by switch depth, deepest first
pub type DecoGasList = Vec<DecoGasChange, NUM_GASES>;

/// Source of the persisted configuration
pub trait ConfigProvider {
    /// Current configuration snapshot
    fn settings(&self) -> &Settings;
}

/// Persisted configuration relevant to the dive core
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Dive mode selected on the surface
    pub dive_mode: DiveMode,
    /// Loop ppO2 source
    pub ccr_mode: CcrMode,
    /// Rebreather is available for bailout return
    pub ccr_option: bool,
    /// Gas table, see [`crate::constants::gas`]
    pub gas: [GasSlot; GAS_TABLE_LEN],
    /// Setpoint table
    pub setpoint: [SetpointSlot; SETPOINT_TABLE_LEN],
    /// Decompression algorithm selection
    pub deco_type: DecoType,
    /// Gradient factor low (%)
    pub gf_low: u8,
    /// Gradient factor high (%)
    pub gf_high: u8,
    /// VPM conservatism level
    pub vpm_conservatism: u8,
    /// Minimum ppO2 (cbar)
    pub ppo2_min_cbar: u8,
    /// ppO2 ceiling while at depth (cbar)
    pub ppo2_max_std_cbar: u8,
    /// ppO2 ceiling once the diver left max depth (cbar)
    pub ppo2_max_deco_cbar: u8,
    /// Ascent rate warning level (m/min)
    pub ascent_rate_max_m_min: u8,
    /// CNS warning level (%)
    pub cns_warning_percent: u8,
    /// CO2 alarm level (ppm)
    pub co2_alarm_ppm: u16,
    /// Last stop depth (m)
    pub last_stop_m: u8,
    /// Spacing between stops (m)
    pub stop_increment_m: u8,
    /// PSCR O2 drop (%)
    pub pscr_o2_drop_percent: u8,
    /// PSCR lung ratio (1:n)
    pub pscr_lung_ratio: u8,
    /// Setpoint switches happen without diver confirmation
    pub auto_setpoint: bool,
    /// Hold the low setpoint switch while a stop is pending
    pub delay_setpoint_low: bool,
    /// Switch to fixed setpoint when all O2 cells are lost
    pub fallback_to_fixed_setpoint: bool,
    /// Buzzer is driven by warnings
    pub buzzer_enabled: bool,
    /// Bitmask of O2 cells excluded by the diver
    pub o2_sensors_deactivated: u8,
    /// Dive timer duration (s)
    pub timer_duration_s: u16,
}

impl Default for Settings {
    fn default() -> Self {
        let mut gas = [GasSlot::default(); GAS_TABLE_LEN];
        gas[1] = GasSlot::new(AIR_OXYGEN_PERCENT, 0).first();
        gas[NUM_OFFSET_DILUENT + 1] = GasSlot::new(AIR_OXYGEN_PERCENT, 0).first();

        let mut setpoint = [SetpointSlot::default(); SETPOINT_TABLE_LEN];
        for (slot, (cbar, depth)) in setpoint
            .iter_mut()
            .skip(1)
            .zip([(70u8, 0u8), (90, 20), (100, 30), (120, 40), (130, 50)])
        {
            *slot = SetpointSlot::new(cbar, depth);
            slot.note.active = false;
        }
        setpoint[1].note.active = true;
        setpoint[1].note.first = true;

        Self {
            dive_mode: DiveMode::Oc,
            ccr_mode: CcrMode::FixedSetpoint,
            ccr_option: false,
            gas,
            setpoint,
            deco_type: DecoType::default(),
            gf_low: 30,
            gf_high: 85,
            vpm_conservatism: 2,
            ppo2_min_cbar: 19,
            ppo2_max_std_cbar: 140,
            ppo2_max_deco_cbar: 160,
            ascent_rate_max_m_min: 10,
            cns_warning_percent: CNS_WARNING_PERCENT,
            co2_alarm_ppm: CO2_ALARM_PPM,
            last_stop_m: 3,
            stop_increment_m: DEFAULT_STOP_INCREMENT_M,
            pscr_o2_drop_percent: 4,
            pscr_lung_ratio: 10,
            auto_setpoint: false,
            delay_setpoint_low: false,
            fallback_to_fixed_setpoint: true,
            buzzer_enabled: true,
            o2_sensors_deactivated: 0,
            timer_duration_s: 180,
        }
    }
}

impl ConfigProvider for Settings {
    fn settings(&self) -> &Settings {
        self
    }
}

/// Per-dive mutable copy of the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DiveSettings {
    /// Dive mode in effect (changes on bailout)
    pub dive_mode: DiveMode,
    /// Loop ppO2 source in effect (changes on fallback)
    pub ccr_mode: CcrMode,
    /// Rebreather is available for bailout return
    pub ccr_option: bool,
    /// Gas table
    pub gas: [GasSlot; GAS_TABLE_LEN],
    /// Setpoint table
    pub setpoint: [SetpointSlot; SETPOINT_TABLE_LEN],
    /// Decompression algorithm selection
    pub deco_type: DecoType,
    /// Gradient factor low (%)
    pub gf_low: u8,
    /// Gradient factor high (%)
    pub gf_high: u8,
    /// VPM conservatism level
    pub vpm_conservatism: u8,
    /// Minimum ppO2 (cbar)
    pub ppo2_min_cbar: u8,
    /// ppO2 ceiling while at depth (cbar)
    pub ppo2_max_std_cbar: u8,
    /// ppO2 ceiling once the diver left max depth (cbar)
    pub ppo2_max_deco_cbar: u8,
    /// Ascent rate warning level (m/min)
    pub ascent_rate_max_m_min: u8,
    /// CNS warning level (%)
    pub cns_warning_percent: u8,
    /// CO2 alarm level (ppm)
    pub co2_alarm_ppm: u16,
    /// Last stop depth (m)
    pub last_stop_m: u8,
    /// Spacing between stops (m)
    pub stop_increment_m: u8,
    /// First stop increment deeper than the last stop (m)
    pub second_to_last_stop_m: u8,
    /// Deco gas change list handed to the decompression planner
    ///
    /// Frozen at dive start. Gas advisories read the live gas table instead,
    /// so a gas switched off underway is no longer proposed.
    pub deco_gas_changes: DecoGasList,
    /// PSCR O2 drop (%)
    pub pscr_o2_drop_percent: u8,
    /// PSCR lung ratio (1:n)
    pub pscr_lung_ratio: u8,
    /// Setpoint switches happen without diver confirmation
    pub auto_setpoint: bool,
    /// Hold the low setpoint switch while a stop is pending
    pub delay_setpoint_low: bool,
    /// Switch to fixed setpoint when all O2 cells are lost
    pub fallback_to_fixed_setpoint: bool,
    /// Fallback to fixed setpoint happened this dive
    pub fallback_active: bool,
    /// Buzzer is driven by warnings
    pub buzzer_enabled: bool,
    /// Bitmask of O2 cells excluded by the diver
    pub o2_sensors_deactivated: u8,
    /// Dive timer duration (s)
    pub timer_duration_s: u16,
}

impl Default for DiveSettings {
    fn default() -> Self {
        Self::from_parts(&Settings::default(), Vec::new())
    }
}

impl DiveSettings {
    /// Materialize the snapshot used for one dive
    ///
    /// Picks the starting loop sub-mode (PSCR has no fixed setpoint and falls
    /// back to simulated ppO2), copies the tables, asks the decompression
    /// model for the deco gas change list and derives the second to last stop.
    pub fn from_settings<M: DecoModel + ?Sized>(settings: &Settings, model: &M) -> Self {
        let mut dive = Self::from_parts(settings, Vec::new());
        dive.deco_gas_changes = model.deco_gas_changes(&dive);
        log_info!(
            "Dive settings created: mode {:?}, ccr {:?}, {} deco gases",
            dive.dive_mode,
            dive.ccr_mode,
            dive.deco_gas_changes.len()
        );
        dive
    }

    fn from_parts(settings: &Settings, deco_gas_changes: DecoGasList) -> Self {
        let ccr_mode = match (settings.dive_mode, settings.ccr_mode) {
            (DiveMode::Pscr, CcrMode::FixedSetpoint) => CcrMode::SimPpo2,
            (_, mode) => mode,
        };

        Self {
            dive_mode: settings.dive_mode,
            ccr_mode,
            ccr_option: settings.ccr_option,
            gas: settings.gas,
            setpoint: settings.setpoint,
            deco_type: settings.deco_type,
            gf_low: settings.gf_low,
            gf_high: settings.gf_high,
            vpm_conservatism: settings.vpm_conservatism,
            ppo2_min_cbar: settings.ppo2_min_cbar,
            ppo2_max_std_cbar: settings.ppo2_max_std_cbar,
            ppo2_max_deco_cbar: settings.ppo2_max_deco_cbar,
            ascent_rate_max_m_min: settings.ascent_rate_max_m_min,
            cns_warning_percent: settings.cns_warning_percent,
            co2_alarm_ppm: settings.co2_alarm_ppm,
            last_stop_m: settings.last_stop_m,
            stop_increment_m: settings.stop_increment_m,
            second_to_last_stop_m: second_to_last_stop(settings.last_stop_m, settings.stop_increment_m),
            deco_gas_changes,
            pscr_o2_drop_percent: settings.pscr_o2_drop_percent,
            pscr_lung_ratio: settings.pscr_lung_ratio,
            auto_setpoint: settings.auto_setpoint,
            delay_setpoint_low: settings.delay_setpoint_low,
            fallback_to_fixed_setpoint: settings.fallback_to_fixed_setpoint,
            fallback_active: false,
            buzzer_enabled: settings.buzzer_enabled,
            o2_sensors_deactivated: settings.o2_sensors_deactivated,
            timer_duration_s: settings.timer_duration_s,
        }
    }

    /// Checked gas table lookup
    pub fn gas(&self, id: GasId) -> StateResult<&GasSlot> {
        self.gas
            .get(id as usize)
            .ok_or(StateError::GasIdOutOfRange { id, max: MAX_GAS_ID })
    }

    /// Checked setpoint table lookup
    pub fn setpoint(&self, id: u8) -> StateResult<&SetpointSlot> {
        self.setpoint
            .get(id as usize)
            .ok_or(StateError::SetpointIdOutOfRange { id, max: MAX_SETPOINT_ID })
    }

    /// Gas slot with the index clamped into the table
    pub fn gas_clamped(&self, id: GasId) -> &GasSlot {
        &self.gas[(id as usize).min(GAS_TABLE_LEN - 1)]
    }

    /// First gas marked "first" in the open circuit or diluent range
    pub fn first_gas_id(&self, diluent: bool) -> Option<GasId> {
        let offset = if diluent { NUM_OFFSET_DILUENT } else { 0 };
        (offset + 1..=offset + NUM_GASES)
            .find(|&i| self.gas[i].note.first && self.gas[i].note.active)
            .map(|i| i as GasId)
    }

    /// First active setpoint marked "first"
    pub fn first_setpoint_id(&self) -> Option<u8> {
        (1..SETPOINT_TABLE_LEN)
            .find(|&i| self.setpoint[i].note.first && self.setpoint[i].note.active)
            .map(|i| i as u8)
    }

    /// PSCR O2 drop factor: `1 / lung_ratio * o2_drop`
    pub fn pscr_factor(&self) -> f32 {
        if self.pscr_lung_ratio == 0 {
            return 0.0;
        }
        1.0 / self.pscr_lung_ratio as f32 * self.pscr_o2_drop_percent as f32
    }
}

/// Walk stop increments until the last stop depth is exceeded
fn second_to_last_stop(last_stop_m: u8, stop_increment_m: u8) -> u8 {
    let increment = if stop_increment_m == 0 { DEFAULT_STOP_INCREMENT_M } else { stop_increment_m };
    let mut depth: u8 = 0;
    while depth <= last_stop_m {
        depth = depth.saturating_add(increment);
        if depth == u8::MAX {
            break;
        }
    }
    depth
}
