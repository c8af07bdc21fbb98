//! Common test utilities for integration tests
//!
//! This module provides:
//! - A recording decompression model standing in for the numerics library
//! - Telemetry builders for descents and ascents
//! - Pre-built dive scenarios (see [`scenarios`])

#![allow(dead_code)]

use core::cell::{Cell, RefCell};

use diveguard_core::deco::{CrushWindow, DecoModel, DecoStop, VpmState};
use diveguard_core::state::LifeData;
use diveguard_core::{DiveState, Mode, Telemetry};

pub mod scenarios;

/// Decompression model that records what the core asked of it
///
/// ppO2 and the gas change list use the crate defaults. CNS grows by a fixed
/// amount per second so exposure tests have something to look at.
#[derive(Default)]
pub struct RecordingModel {
    pub crush_calls: Cell<u32>,
    pub crush_windows: RefCell<Vec<CrushWindow>>,
    pub exposure_seconds: Cell<u32>,
    pub cns_per_second: f32,
}

impl RecordingModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cns_rate(cns_per_second: f32) -> Self {
        Self { cns_per_second, ..Self::default() }
    }
}

impl DecoModel for RecordingModel {
    fn update_oxygen_exposure(&self, life: &mut LifeData, dt_s: u32) {
        self.exposure_seconds.set(self.exposure_seconds.get() + dt_s);
        life.cns_percent += self.cns_per_second * dt_s as f32;
    }

    fn crushing_pressure(&self, vpm: &mut VpmState, _life: &LifeData, window: &CrushWindow) {
        self.crush_calls.set(self.crush_calls.get() + 1);
        self.crush_windows.borrow_mut().push(*window);
        for value in vpm.max_crushing_pressure_n2.iter_mut() {
            if window.rate > *value {
                *value = window.rate;
            }
        }
    }
}

/// One telemetry sample at `depth_m` in salt-free water
pub fn sample_at(depth_m: f32, dive_time_s: u32) -> Telemetry {
    Telemetry {
        mode: if depth_m > 0.0 { Mode::Dive } else { Mode::Surface },
        depth_m,
        pressure_ambient_bar: 1.0 + depth_m / 10.0,
        pressure_surface_bar: 1.0,
        dive_time_s,
        battery_charge_percent: 80.0,
        battery_voltage: 3.9,
        ..Telemetry::default()
    }
}

/// Linear profile from `from_m` to `to_m`, one sample per second
pub fn profile(from_m: f32, to_m: f32, start_s: u32, duration_s: u32) -> Vec<Telemetry> {
    (0..=duration_s)
        .map(|t| {
            let fraction = t as f32 / duration_s.max(1) as f32;
            sample_at(from_m + (to_m - from_m) * fraction, start_s + t)
        })
        .collect()
}

/// Publish a single stop with `deco_zone_start_m` into the Bühlmann plan
pub fn set_obligation(state: &mut DiveState, stop_m: f32, deco_zone_start_m: f32) {
    let plan = &mut state.deco_buehlmann;
    plan.stops.clear();
    plan.stops
        .push(DecoStop { depth_m: stop_m, length_s: 180 })
        .expect("one stop fits");
    plan.ndl_s = 0;
    plan.deco_zone_start_m = deco_zone_start_m;
}
