//! VPM crushing pressure integrator
//!
//! Event-triggered fixed-window integrator feeding the VPM bubble model.
//! It keeps a baseline (ambient pressure, tissue loadings, dive time) and
//! calls the model once per window in which the diver descended:
//!
//! ```text
//! dive_time ≤ 4 s or not deeper than baseline  ──▶ re-baseline, no call
//! ≥ 4 s since baseline and rise > 0.5 msw      ──▶ call model, re-baseline
//! otherwise                                    ──▶ wait
//! ```
//!
//! The window length must match what the model assumes when it turns the
//! average descent rate into a crushing pressure.

use crate::constants::deco::{METERS_PER_BAR, VPM_CRUSH_MIN_RISE_MSW};
use crate::constants::limits::NUM_COMPARTMENTS;
use crate::constants::time::{SECONDS_PER_MINUTE, VPM_CRUSH_WINDOW_S};
use crate::deco::{CrushWindow, DecoModel, VpmState};
use crate::state::LifeData;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Baseline {
    dive_time_s: u32,
    ambient: f32,
    helium: [f32; NUM_COMPARTMENTS],
    nitrogen: [f32; NUM_COMPARTMENTS],
}

impl Baseline {
    fn capture(life: &LifeData) -> Self {
        let mut helium = [0.0; NUM_COMPARTMENTS];
        let mut nitrogen = [0.0; NUM_COMPARTMENTS];
        for i in 0..NUM_COMPARTMENTS {
            helium[i] = life.tissue_helium_bar[i] * METERS_PER_BAR;
            nitrogen[i] = life.tissue_nitrogen_bar[i] * METERS_PER_BAR;
        }
        Self {
            dive_time_s: life.dive_time_s,
            ambient: life.pressure_ambient_bar * METERS_PER_BAR,
            helium,
            nitrogen,
        }
    }
}

/// Rolling-window crushing pressure integrator
#[derive(Debug, Clone, Default)]
pub struct VpmCrushIntegrator {
    baseline: Option<Baseline>,
    recomputes: u32,
}

impl VpmCrushIntegrator {
    /// Integrator without a baseline
    pub const fn new() -> Self {
        Self { baseline: None, recomputes: 0 }
    }

    /// Run one step; true when the model was called
    pub fn vpm_crush<M: DecoModel + ?Sized>(
        &mut self,
        model: &M,
        vpm: &mut VpmState,
        life: &LifeData,
    ) -> bool {
        let ending_ambient = life.pressure_ambient_bar * METERS_PER_BAR;

        let baseline = match self.baseline {
            Some(baseline)
                if life.dive_time_s > VPM_CRUSH_WINDOW_S && baseline.ambient < ending_ambient =>
            {
                baseline
            }
            _ => {
                self.baseline = Some(Baseline::capture(life));
                return false;
            }
        };

        if life.dive_time_s.saturating_sub(baseline.dive_time_s) < VPM_CRUSH_WINDOW_S
            || ending_ambient <= baseline.ambient + VPM_CRUSH_MIN_RISE_MSW
        {
            return false;
        }

        let rate = (ending_ambient - baseline.ambient) * SECONDS_PER_MINUTE as f32
            / VPM_CRUSH_WINDOW_S as f32;
        let window = CrushWindow {
            start_ambient: baseline.ambient,
            start_helium: baseline.helium,
            start_nitrogen: baseline.nitrogen,
            rate,
        };
        model.crushing_pressure(vpm, life, &window);

        self.baseline = Some(Baseline::capture(life));
        self.recomputes = self.recomputes.wrapping_add(1);
        log_debug!("VPM crush recomputed at {} s, rate {} msw/min", life.dive_time_s, rate);
        true
    }

    /// Drop the baseline; the next step only re-baselines
    pub fn reset(&mut self) {
        self.baseline = None;
    }

    /// Dive time of the current baseline (s)
    pub fn baseline_time_s(&self) -> Option<u32> {
        self.baseline.map(|baseline| baseline.dive_time_s)
    }

    /// Number of model calls so far
    pub fn recomputes(&self) -> u32 {
        self.recomputes
    }
}
