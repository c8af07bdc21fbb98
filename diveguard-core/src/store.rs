//! Dive state store
//!
//! Owns the three [`DiveState`] instances and everything that composes them:
//!
//! ```text
//!                       ┌──────────── view ────────────┐
//!  telemetry ──▶ Real ──┤                              ├──▶ state() / state_mut()
//!                 │     └─ Sim (planning copy) ────────┘
//!                 │
//!                 └─ begin_deco_recompute ──▶ Deco ──▶ publish_deco_result ──▶ Real
//! ```
//!
//! Read and write access always target the same instance: [`View`] selects
//! it, and the borrow checker guarantees there is at most one writer.
//!
//! The deco lock is a single-writer flag around the scratch state. While a
//! recompute is running the tick keeps reading the last published
//! [`DecoInfo`] of Real and never sees a half-written one.

use crate::buzzer::BuzzerState;
use crate::commands::{SensorCommand, SensorCommands};
use crate::constants::gas::NUM_OFFSET_DILUENT;
use crate::deco::{DecoInfo, DecoModel};
use crate::errors::{StateError, StateResult};
use crate::gas::{DiveMode, GasId};
use crate::selector::{set_actual_gas, GasSetpointSelector};
use crate::settings::{ConfigProvider, DiveSettings};
use crate::state::{DiveState, Telemetry};
use crate::time::Tick;
use crate::usage::DeviceUsage;
use crate::vpm::VpmCrushIntegrator;
use crate::warnings::WarningEngine;

/// Instance the read and write accessors point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Hardware-observed state
    #[default]
    Real,
    /// Planning simulator
    Sim,
}

/// Decompression recompute handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoLock {
    /// No recompute in flight, published results are stable
    #[default]
    Idle,
    /// Scratch state is handed out to the recompute
    Running,
}

/// Outcome of one control-loop tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// The VPM crushing pressure model was called
    pub vpm_recomputed: bool,
    /// Warnings raised this tick
    pub num_warnings: i8,
    /// Buzzer output after the tick
    pub buzzer_on: bool,
}

/// Root of the dive state
#[derive(Debug, Clone)]
pub struct DiveStateStore {
    real: DiveState,
    sim: DiveState,
    deco: DiveState,
    usage: DeviceUsage,
    view: View,
    deco_lock: DecoLock,
    selector: GasSetpointSelector,
    warnings: WarningEngine,
    vpm: VpmCrushIntegrator,
    commands: SensorCommands,
}

impl Default for DiveStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiveStateStore {
    /// Store at firmware init: surface mode, Real view
    pub fn new() -> Self {
        Self {
            real: DiveState::default(),
            sim: DiveState::default(),
            deco: DiveState::default(),
            usage: DeviceUsage::default(),
            view: View::Real,
            deco_lock: DecoLock::Idle,
            selector: GasSetpointSelector::new(),
            warnings: WarningEngine::new(),
            vpm: VpmCrushIntegrator::new(),
            commands: SensorCommands::default(),
        }
    }

    // View selection

    /// Point reads and writes at Real
    pub fn use_real(&mut self) {
        if self.view != View::Real {
            log_debug!("State view -> Real");
        }
        self.view = View::Real;
    }

    /// Point reads and writes at Sim
    pub fn use_sim(&mut self) {
        if self.view != View::Sim {
            log_debug!("State view -> Sim");
        }
        self.view = View::Sim;
    }

    /// Planning mode is active
    pub fn is_sim_active(&self) -> bool {
        self.view == View::Sim
    }

    /// Current view
    pub fn view(&self) -> View {
        self.view
    }

    /// State selected by the view
    pub fn state(&self) -> &DiveState {
        match self.view {
            View::Real => &self.real,
            View::Sim => &self.sim,
        }
    }

    /// The single writer of the state selected by the view
    pub fn state_mut(&mut self) -> &mut DiveState {
        match self.view {
            View::Real => &mut self.real,
            View::Sim => &mut self.sim,
        }
    }

    /// Hardware-observed state, regardless of view
    pub fn real(&self) -> &DiveState {
        &self.real
    }

    /// Planning state, regardless of view
    pub fn sim(&self) -> &DiveState {
        &self.sim
    }

    /// Device-lifetime usage record
    pub fn usage(&self) -> &DeviceUsage {
        &self.usage
    }

    /// Pending requests for the sensing controller
    pub fn commands_mut(&mut self) -> &mut SensorCommands {
        &mut self.commands
    }

    // Dive setup

    /// Materialize the per-dive settings into Real at dive start
    ///
    /// Also resets the selection state of the previous dive and puts the
    /// diver on the starting gas and setpoint.
    pub fn create_dive_settings<C, M>(&mut self, config: &C, model: &M)
    where
        C: ConfigProvider + ?Sized,
        M: DecoModel + ?Sized,
    {
        let real = &mut self.real;
        real.settings = DiveSettings::from_settings(config.settings(), model);
        real.warnings = Default::default();
        real.life.max_depth_m = 0.0;
        real.life.average_depth_m = 0.0;

        self.selector.reset();
        self.warnings.reset_fallback();
        self.vpm.reset();
        self.usage.start_dive();

        let diluent = real.settings.dive_mode == DiveMode::Ccr;
        let range_start = if diluent { NUM_OFFSET_DILUENT as GasId + 1 } else { 1 };
        let gas_id = real.settings.first_gas_id(diluent).unwrap_or(range_start);
        let setpoint_cbar = match real.settings.first_setpoint_id() {
            Some(id) if real.settings.dive_mode.is_loop() => {
                real.settings.setpoint[id as usize].setpoint_cbar
            }
            _ => 0,
        };
        set_actual_gas(&mut real.life, &real.settings, gas_id, setpoint_cbar);
    }

    /// Snapshot Real into Sim
    pub fn copy_dive_settings_to_sim(&mut self) {
        self.sim = self.real.clone();
    }

    /// Clear the one-shot events of one instance after the logger consumed them
    pub fn reset_events(&mut self, view: View) {
        match view {
            View::Real => self.real.events.reset(),
            View::Sim => self.sim.events.reset(),
        }
    }

    /// Start the dive timer of the viewed state
    pub fn start_timer(&mut self) {
        let state = self.state_mut();
        let dive_time_s = state.life.dive_time_s;
        state.timer.start(dive_time_s);
    }

    /// Stop the dive timer of the viewed state
    pub fn disable_timer(&mut self) {
        self.state_mut().timer.disable();
    }

    // Decompression

    /// Published plan of the configured algorithm for the viewed state
    pub fn get_deco_info(&self) -> &DecoInfo {
        self.state().deco_info()
    }

    /// Forget all decompression results and ask the sensing side to do the same
    ///
    /// A recompute in flight is abandoned; its publish will be rejected.
    pub fn clear_deco(&mut self) {
        self.real.clear_deco_info();
        self.sim.clear_deco_info();
        self.vpm.reset();
        self.deco_lock = DecoLock::Idle;
        self.commands.request(SensorCommand::ClearDeco);
    }

    /// State of the deco lock
    pub fn deco_lock(&self) -> DecoLock {
        self.deco_lock
    }

    /// Take the scratch state for a decompression recompute
    ///
    /// Snapshots Real into the scratch copy. `WouldBlock` while a previous
    /// recompute has not been published.
    pub fn begin_deco_recompute(&mut self) -> nb::Result<&mut DiveState, StateError> {
        if self.deco_lock == DecoLock::Running {
            log_warn!("Deco recompute requested while one is running");
            return Err(nb::Error::WouldBlock);
        }
        self.deco = self.real.clone();
        self.deco_lock = DecoLock::Running;
        Ok(&mut self.deco)
    }

    /// Copy the four plans of the scratch state into Real and release the lock
    pub fn publish_deco_result(&mut self, tickstamp: Tick) -> StateResult<()> {
        if self.deco_lock != DecoLock::Running {
            return Err(StateError::DecoNotRunning);
        }

        let deco = &mut self.deco;
        for info in [
            &mut deco.deco_buehlmann,
            &mut deco.deco_vpm,
            &mut deco.deco_future_buehlmann,
            &mut deco.deco_future_vpm,
        ] {
            info.tickstamp = tickstamp;
        }
        self.real.deco_buehlmann = deco.deco_buehlmann.clone();
        self.real.deco_vpm = deco.deco_vpm.clone();
        self.real.deco_future_buehlmann = deco.deco_future_buehlmann.clone();
        self.real.deco_future_vpm = deco.deco_future_vpm.clone();
        self.real.vpm = deco.vpm;

        self.deco_lock = DecoLock::Idle;
        Ok(())
    }

    // Advisories

    /// Better gas (diluent on the loop) for UI highlighting
    pub fn actual_better_gas_id(&self) -> GasId {
        self.selector.actual_better_gas_id()
    }

    /// Better bailout gas for UI highlighting
    pub fn actual_better_bailout_gas_id(&self) -> GasId {
        self.selector.actual_better_bailout_gas_id()
    }

    /// Better setpoint for UI highlighting
    pub fn actual_better_setpoint_id(&self) -> u8 {
        self.selector.actual_better_setpoint_id()
    }

    /// Selection state, read only
    pub fn selector(&self) -> &GasSetpointSelector {
        &self.selector
    }

    // Per tick

    /// Copy one telemetry sample into Real and update what derives from it
    pub fn ingest_telemetry<M: DecoModel + ?Sized>(&mut self, sample: &Telemetry, model: &M, epoch_s: u32) {
        let real = &mut self.real;
        real.mode = sample.mode;
        let dt_s = real.life.apply_telemetry(sample);

        real.life.ppo2_bar = model.ppo2_bar(&real.life, &real.settings);
        if dt_s > 0 {
            model.update_oxygen_exposure(&mut real.life, dt_s);
        }
        real.timer.update(real.life.dive_time_s, real.settings.timer_duration_s);
        self.usage.record(&real.life, epoch_s);
    }

    /// One control-loop tick: VPM crush (VPM dives only), then warnings
    pub fn tick<M: DecoModel + ?Sized>(&mut self, model: &M, now: Tick, mute: bool) -> TickReport {
        let vpm_recomputed = if self.real.settings.deco_type.is_vpm() {
            self.vpm.vpm_crush(model, &mut self.real.vpm, &self.real.life)
        } else {
            false
        };

        let num_warnings = self.check_warning(now, mute);
        TickReport {
            vpm_recomputed,
            num_warnings,
            buzzer_on: self.warnings.buzzer_state() == BuzzerState::On,
        }
    }

    /// Full warning pass against Real
    pub fn check_warning(&mut self, now: Tick, mute: bool) -> i8 {
        self.warnings.check_warning2(&mut self.real, &mut self.selector, now, mute)
    }

    /// Full warning pass against an explicit state
    pub fn check_warning2(&mut self, state: &mut DiveState, now: Tick, mute: bool) -> i8 {
        self.warnings.check_warning2(state, &mut self.selector, now, mute)
    }

    /// Buzzer output after the last warning pass
    pub fn buzzer_state(&self) -> BuzzerState {
        self.warnings.buzzer_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deco::{DecoStop, NoDecoModel};
    use crate::settings::Settings;
    use crate::state::Mode;

    #[test]
    fn view_switch_is_a_pair() {
        let mut store = DiveStateStore::new();
        assert!(!store.is_sim_active());

        store.use_sim();
        store.state_mut().life.depth_m = 42.0;
        assert_eq!(store.state().life.depth_m, 42.0);
        assert_eq!(store.real().life.depth_m, 0.0);

        store.use_real();
        assert_eq!(store.state().life.depth_m, 0.0);
    }

    #[test]
    fn dive_start_puts_diver_on_first_gas() {
        let mut store = DiveStateStore::new();
        let settings = Settings { dive_mode: DiveMode::Ccr, ..Settings::default() };
        store.create_dive_settings(&settings, &NoDecoModel);

        let gas = store.real().life.actual_gas;
        assert_eq!(gas.gas_id, 6);
        assert_eq!(gas.setpoint_cbar, 70);
        assert_eq!(store.usage().dive_count, 1);
    }

    #[test]
    fn deco_lock_handshake() {
        let mut store = DiveStateStore::new();
        {
            let scratch = store.begin_deco_recompute().unwrap();
            scratch.deco_buehlmann.ndl_s = 0;
            scratch.deco_buehlmann.stops.push(DecoStop { depth_m: 3.0, length_s: 180 }).unwrap();
        }
        assert!(matches!(store.begin_deco_recompute(), Err(nb::Error::WouldBlock)));
        // Not published yet
        assert!(!store.get_deco_info().has_obligation());

        store.publish_deco_result(1234).unwrap();
        assert_eq!(store.deco_lock(), DecoLock::Idle);
        assert!(store.get_deco_info().has_obligation());
        assert_eq!(store.get_deco_info().tickstamp, 1234);

        assert_eq!(store.publish_deco_result(0), Err(StateError::DecoNotRunning));
    }

    #[test]
    fn clear_deco_resets_plans_and_queues_command() {
        let mut store = DiveStateStore::new();
        store.begin_deco_recompute().unwrap().deco_buehlmann.ndl_s = 600;
        store.publish_deco_result(1).unwrap();
        store.copy_dive_settings_to_sim();

        store.clear_deco();
        assert_eq!(store.real().deco_buehlmann, DecoInfo::default());
        assert_eq!(store.sim().deco_buehlmann, DecoInfo::default());
        assert_eq!(store.commands_mut().take(), Some(SensorCommand::ClearDeco));
    }

    #[test]
    fn tick_reports_warnings() {
        let model = NoDecoModel;
        let mut store = DiveStateStore::new();
        store.create_dive_settings(&Settings::default(), &model);

        let sample = Telemetry {
            mode: Mode::Dive,
            depth_m: 10.0,
            pressure_ambient_bar: 2.0,
            dive_time_s: 60,
            ascent_rate_m_min: 18.0,
            ..Telemetry::default()
        };
        store.ingest_telemetry(&sample, &model, 1_700_000_000);
        let report = store.tick(&model, 1_000, false);

        assert_eq!(report.num_warnings, 1);
        assert!(report.buzzer_on);
        assert!(!report.vpm_recomputed);
        assert_eq!(store.real().warnings.ascent_rate_high, 1);
    }
}
