//! Pre-built dive configurations
//!
//! Each scenario returns persisted settings plus a store that already went
//! through dive start, so tests only need to feed telemetry.

use diveguard_core::gas::{GasSlot, SetpointSlot};
use diveguard_core::{CcrMode, DiveMode, DiveStateStore, Settings};

use super::RecordingModel;

/// Open circuit: air bottom gas, EAN50 at 21 m, oxygen at 9 m
pub fn oc_two_deco_gases() -> Settings {
    let mut settings = Settings::default();
    settings.gas[1] = GasSlot::new(21, 0).first();
    settings.gas[2] = GasSlot::new(50, 0).deco_at(21);
    settings.gas[3] = GasSlot::new(100, 0).deco_at(9);
    settings
}

/// Closed circuit on sensors, air diluent, auto-setpoint 0.7 / 1.3 / 1.4
pub fn ccr_auto_setpoint() -> Settings {
    let mut settings = Settings {
        dive_mode: DiveMode::Ccr,
        ccr_mode: CcrMode::Sensors,
        ccr_option: true,
        auto_setpoint: true,
        ..Settings::default()
    };
    settings.setpoint[1] = SetpointSlot::new(70, 3);
    settings.setpoint[1].note.first = true;
    settings.setpoint[2] = SetpointSlot::new(130, 12);
    settings.setpoint[3] = SetpointSlot::new(140, 0);
    settings.gas[1] = GasSlot::new(50, 0).deco_at(21);
    settings
}

/// Passive semi-closed loop on EAN32
pub fn pscr_nitrox() -> Settings {
    let mut settings = Settings {
        dive_mode: DiveMode::Pscr,
        ..Settings::default()
    };
    settings.gas[1] = GasSlot::new(32, 0).first();
    settings
}

/// Store with `settings` applied at dive start
pub fn store_for(settings: &Settings, model: &RecordingModel) -> DiveStateStore {
    let mut store = DiveStateStore::new();
    store.create_dive_settings(settings, model);
    store
}
