//! Decompression model seam
//!
//! The tissue loading, Bühlmann and VPM numerics are not part of this core.
//! They are consumed through [`DecoModel`] as deterministic functions over
//! explicit inputs. The core only owns what it publishes to the rest of the
//! system: the [`DecoInfo`] records and the long-lived [`VpmState`].

use heapless::Vec;

use crate::constants::deco::{DECO_MAX_STOPS, WATER_VAPOUR_BAR};
use crate::constants::gas::{NUM_GASES, NUM_OFFSET_DILUENT};
use crate::constants::limits::NUM_COMPARTMENTS;
use crate::gas::{CcrMode, DiveMode};
use crate::settings::{DecoGasChange, DecoGasList, DiveSettings};
use crate::state::LifeData;

/// One decompression stop
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecoStop {
    /// Stop depth (m)
    pub depth_m: f32,
    /// Remaining time at the stop (s)
    pub length_s: u32,
}

/// Published result of one decompression computation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecoInfo {
    /// Stops ordered from the shallowest to the deepest
    pub stops: Vec<DecoStop, DECO_MAX_STOPS>,
    /// No decompression limit (s), zero once a stop is required
    pub ndl_s: u32,
    /// Time to surface (s)
    pub tts_s: u32,
    /// Ceiling (m)
    pub ceiling_m: f32,
    /// Depth where the deco zone begins (m)
    pub deco_zone_start_m: f32,
    /// Tick at which the result was published
    pub tickstamp: u32,
}

impl DecoInfo {
    /// Deepest stop that still has time on it: the next one on the ascent
    pub fn next_stop(&self) -> Option<&DecoStop> {
        self.stops.iter().rev().find(|stop| stop.length_s > 0)
    }

    /// Depth of the next pending stop, zero without obligation
    pub fn next_stop_depth_m(&self) -> f32 {
        self.next_stop().map_or(0.0, |stop| stop.depth_m)
    }

    /// A decompression obligation is pending
    pub fn has_obligation(&self) -> bool {
        self.next_stop().is_some()
    }
}

/// VPM bubble model accumulators
///
/// Lives for the lifetime of the device, not just one dive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VpmState {
    /// Largest crushing pressure seen per compartment, helium (msw)
    pub max_crushing_pressure_he: [f32; NUM_COMPARTMENTS],
    /// Largest crushing pressure seen per compartment, nitrogen (msw)
    pub max_crushing_pressure_n2: [f32; NUM_COMPARTMENTS],
    /// Adjusted critical radius per compartment, helium (µm)
    pub adjusted_critical_radius_he: [f32; NUM_COMPARTMENTS],
    /// Adjusted critical radius per compartment, nitrogen (µm)
    pub adjusted_critical_radius_n2: [f32; NUM_COMPARTMENTS],
}

impl Default for VpmState {
    fn default() -> Self {
        Self {
            max_crushing_pressure_he: [0.0; NUM_COMPARTMENTS],
            max_crushing_pressure_n2: [0.0; NUM_COMPARTMENTS],
            adjusted_critical_radius_he: [0.45; NUM_COMPARTMENTS],
            adjusted_critical_radius_n2: [0.55; NUM_COMPARTMENTS],
        }
    }
}

/// Start conditions of a crushing pressure window
///
/// Pressures are in msw (bar × 10), the unit the VPM numerics use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrushWindow {
    /// Ambient pressure at the window start (msw)
    pub start_ambient: f32,
    /// Tissue helium pressure at the window start (msw)
    pub start_helium: [f32; NUM_COMPARTMENTS],
    /// Tissue nitrogen pressure at the window start (msw)
    pub start_nitrogen: [f32; NUM_COMPARTMENTS],
    /// Average descent rate over the window (msw/min)
    pub rate: f32,
}

/// Decompression model consumed by the core
///
/// Every method is a pure function over its inputs apart from the explicitly
/// passed mutable state.
pub trait DecoModel {
    /// Inspired ppO2 (bar) for the current gas and ambient pressure
    fn ppo2_bar(&self, life: &LifeData, settings: &DiveSettings) -> f32 {
        default_ppo2_bar(life, settings)
    }

    /// Accumulate CNS and OTU over `dt_s` seconds at the current ppO2
    fn update_oxygen_exposure(&self, life: &mut LifeData, dt_s: u32);

    /// Update the crushing pressure accumulators for one descent window
    fn crushing_pressure(&self, vpm: &mut VpmState, life: &LifeData, window: &CrushWindow);

    /// Ordered deco gas change list for a dive
    fn deco_gas_changes(&self, settings: &DiveSettings) -> DecoGasList {
        default_gas_change_list(settings)
    }
}

/// Inspired ppO2 from the actual gas, honouring loop setpoints
pub fn default_ppo2_bar(life: &LifeData, settings: &DiveSettings) -> f32 {
    let gas = &life.actual_gas;
    let ambient = life.pressure_ambient_bar;
    let fraction_o2 = gas.oxygen_percent() as f32 / 100.0;

    match gas.applied_dive_mode {
        DiveMode::Ccr if gas.setpoint_cbar > 0 => {
            let setpoint = gas.setpoint_cbar as f32 / 100.0;
            let sensor_mean = life.ppo2_sensor_mean_bar(settings.o2_sensors_deactivated);
            if settings.ccr_mode == CcrMode::Sensors && sensor_mean > 0.0 {
                sensor_mean
            } else if setpoint > ambient {
                ambient
            } else {
                setpoint
            }
        }
        DiveMode::Pscr => {
            let inspired = (ambient - WATER_VAPOUR_BAR) * fraction_o2
                - gas.pscr_factor / 100.0 * (1.0 - fraction_o2);
            if inspired < 0.0 { 0.0 } else { inspired }
        }
        _ => {
            let inspired = (ambient - WATER_VAPOUR_BAR) * fraction_o2;
            if inspired < 0.0 { 0.0 } else { inspired }
        }
    }
}

/// Active deco gases of the range the dive mode breathes, deepest first
pub fn default_gas_change_list(settings: &DiveSettings) -> DecoGasList {
    let offset = if settings.dive_mode == DiveMode::Ccr { NUM_OFFSET_DILUENT } else { 0 };
    let mut list = DecoGasList::new();

    for id in offset + 1..=offset + NUM_GASES {
        let slot = &settings.gas[id];
        if slot.is_usable() && slot.note.deco && slot.depth_m > 0 {
            // Capacity equals the range size, push cannot fail
            let _ = list.push(DecoGasChange { gas_id: id as u8, depth_m: slot.depth_m });
        }
    }

    list.sort_unstable_by(|a, b| b.depth_m.cmp(&a.depth_m));
    list
}

/// Model without tissue numerics
///
/// Leaves CNS/OTU and crushing pressure untouched. Useful for gauge mode
/// and for exercising the core without a decompression library.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecoModel;

impl DecoModel for NoDecoModel {
    fn update_oxygen_exposure(&self, _life: &mut LifeData, _dt_s: u32) {}

    fn crushing_pressure(&self, _vpm: &mut VpmState, _life: &LifeData, _window: &CrushWindow) {}
}
