//! Warning evaluation
//!
//! Every predicate is recomputed from scratch each tick. The order of
//! evaluation is a contract:
//!
//! ```text
//! ascent rate ─ deco missed ─ ppO2 ─ O2 sensors ─ fallback ─ CO2
//!                                                             │
//!                                          drive buzzer ◀─────┘
//!                                                             │
//! CNS ─ better gas ─ better setpoint ─ battery  ◀─────────────┘
//! ```
//!
//! Only the first group can arm the buzzer. The second group counts towards
//! `num_warnings` and the display but stays silent.

use crate::buzzer::{BuzzerDebouncer, BuzzerState};
use crate::constants::deco::{DECO_MISSED_TOLERANCE_M, LEFT_MAX_DEPTH_BAND_M};
use crate::constants::gas::NUM_O2_SENSORS;
use crate::constants::limits::{LOW_BATTERY_PERCENT, O2_SENSOR_MAX_BAR, O2_SENSOR_MIN_BAR};
use crate::constants::time::FALLBACK_DEBOUNCE_MS;
use crate::gas::{CcrMode, DiveMode};
use crate::selector::GasSetpointSelector;
use crate::state::{DiveState, Mode, Warnings};
use crate::time::{elapsed_ms, Tick};

/// Debounced switch from sensor ppO2 to fixed setpoint
///
/// Trips after [`FALLBACK_DEBOUNCE_MS`] without a single usable O2 cell and
/// stays tripped until the next dive.
#[derive(Debug, Clone, Default)]
pub struct FallbackMonitor {
    no_sensor_since: Option<Tick>,
}

impl FallbackMonitor {
    /// Monitor with no pending loss
    pub const fn new() -> Self {
        Self { no_sensor_since: None }
    }

    /// Forget a pending loss
    pub fn reset(&mut self) {
        self.no_sensor_since = None;
    }

    /// Advance with the current state; true when the fallback tripped now
    pub fn update(&mut self, state: &mut DiveState, now: Tick) -> bool {
        let settings = &state.settings;
        if state.mode != Mode::Dive
            || settings.dive_mode != DiveMode::Ccr
            || settings.ccr_mode != CcrMode::Sensors
            || !settings.fallback_to_fixed_setpoint
            || settings.fallback_active
        {
            self.no_sensor_since = None;
            return false;
        }

        if usable_sensors(state) > 0 {
            self.no_sensor_since = None;
            return false;
        }

        let since = *self.no_sensor_since.get_or_insert(now);
        if elapsed_ms(since, now) < FALLBACK_DEBOUNCE_MS {
            return false;
        }

        log_warn!("No usable O2 sensor for {} ms, fallback to fixed setpoint", FALLBACK_DEBOUNCE_MS);
        state.settings.ccr_mode = CcrMode::FixedSetpoint;
        state.settings.fallback_active = true;
        self.no_sensor_since = None;
        true
    }
}

fn sensor_in_bounds(value: f32) -> bool {
    (O2_SENSOR_MIN_BAR..=O2_SENSOR_MAX_BAR).contains(&value)
}

fn usable_sensors(state: &DiveState) -> usize {
    let life = &state.life;
    if life.sensor_link_lost {
        return 0;
    }
    (0..NUM_O2_SENSORS)
        .filter(|&i| {
            let mask = 1u8 << i;
            state.settings.o2_sensors_deactivated & mask == 0
                && life.sensor_errors & mask == 0
                && sensor_in_bounds(life.ppo2_sensor_bar[i])
        })
        .count()
}

/// Warning evaluation pass driving the buzzer
#[derive(Debug, Clone, Default)]
pub struct WarningEngine {
    buzzer: BuzzerDebouncer,
    fallback: FallbackMonitor,
}

impl WarningEngine {
    /// Engine with a silent buzzer
    pub const fn new() -> Self {
        Self {
            buzzer: BuzzerDebouncer::new(),
            fallback: FallbackMonitor::new(),
        }
    }

    /// Buzzer output after the last pass
    pub fn buzzer_state(&self) -> BuzzerState {
        self.buzzer.state()
    }

    /// Start of a new dive: forget a pending sensor loss
    pub fn reset_fallback(&mut self) {
        self.fallback.reset();
    }

    /// Full warning pass against `state`
    ///
    /// Returns `num_warnings`, which is also stored in `state.warnings`.
    pub fn check_warning2(
        &mut self,
        state: &mut DiveState,
        selector: &mut GasSetpointSelector,
        now: Tick,
        mute: bool,
    ) -> i8 {
        state.warnings = Warnings::default();

        state.warnings.ascent_rate_high = check_ascent_rate(state);
        state.warnings.deco_missed = check_deco_missed(state);
        let (low, high) = check_ppo2(state);
        state.warnings.ppo2_low = low;
        state.warnings.ppo2_high = high;
        check_o2_sensors(state);
        state.warnings.fallback = self.check_fallback(state, now);
        state.warnings.co2_high = check_co2(state);

        let eligible = state.warnings.buzzer_eligible() > 0 && state.settings.buzzer_enabled;
        self.buzzer.update(now, eligible, mute);

        state.warnings.cns_high = check_cns(state);
        selector.check_better_gas(state);
        selector.check_better_setpoint(state);
        state.warnings.low_battery = check_battery(state);

        state.warnings.num_warnings = state.warnings.sum_of_flags();
        state.warnings.num_warnings
    }

    fn check_fallback(&mut self, state: &mut DiveState, now: Tick) -> i8 {
        self.fallback.update(state, now);
        (state.mode == Mode::Dive
            && state.settings.dive_mode == DiveMode::Ccr
            && state.settings.fallback_active) as i8
    }
}

fn in_dive(state: &DiveState) -> bool {
    state.mode == Mode::Dive
}

fn check_ascent_rate(state: &DiveState) -> i8 {
    let rate = state.life.ascent_rate_m_min;
    (in_dive(state) && rate > 0.0 && rate >= state.settings.ascent_rate_max_m_min as f32) as i8
}

fn check_deco_missed(state: &DiveState) -> i8 {
    if !in_dive(state) {
        return 0;
    }
    let deco = state.deco_info();
    match deco.next_stop() {
        Some(stop) => (state.life.depth_m < stop.depth_m - DECO_MISSED_TOLERANCE_M) as i8,
        None => 0,
    }
}

fn check_ppo2(state: &DiveState) -> (i8, i8) {
    if !in_dive(state) || matches!(state.settings.dive_mode, DiveMode::Gauge | DiveMode::Apnea) {
        return (0, 0);
    }
    let settings = &state.settings;
    let life = &state.life;
    let local_ppo2 = (life.ppo2_bar * 100.0) as i32;

    let ppo2_max = if life.depth_m < life.max_depth_m - LEFT_MAX_DEPTH_BAND_M {
        i32::from(settings.ppo2_max_deco_cbar)
    } else {
        i32::from(settings.ppo2_max_std_cbar)
    };

    let low = (local_ppo2 + 1 <= settings.ppo2_min_cbar as i32) as i8;
    let high = (local_ppo2 >= ppo2_max + 1) as i8;
    (low, high)
}

fn check_o2_sensors(state: &mut DiveState) {
    let settings = &state.settings;
    if !in_dive(state) || settings.dive_mode != DiveMode::Ccr || settings.ccr_mode != CcrMode::Sensors {
        return;
    }

    let life = &state.life;
    for i in 0..NUM_O2_SENSORS {
        let mask = 1u8 << i;
        if settings.o2_sensors_deactivated & mask != 0 {
            continue;
        }
        let faulty = life.sensor_errors & mask != 0 || !sensor_in_bounds(life.ppo2_sensor_bar[i]);
        state.warnings.sensor_out_of_bounds[i] = faulty as i8;
    }
    state.warnings.sensor_link_lost = life.sensor_link_lost as i8;
}

fn check_co2(state: &DiveState) -> i8 {
    let life = &state.life;
    (in_dive(state) && life.co2_sensor_active && life.co2_ppm >= state.settings.co2_alarm_ppm) as i8
}

fn check_cns(state: &DiveState) -> i8 {
    (in_dive(state) && state.life.cns_percent >= state.settings.cns_warning_percent as f32) as i8
}

fn check_battery(state: &DiveState) -> i8 {
    let charge = state.life.battery_charge_percent;
    (charge > 0.0 && charge < LOW_BATTERY_PERCENT) as i8
}
