//! Dive state records
//!
//! [`DiveState`] is the aggregate every other component reads and writes.
//! Three instances exist at runtime (real, simulated, deco scratch), owned by
//! [`crate::store::DiveStateStore`].
//!
//! The field order of [`DiveState`] is what the processor transport expects
//! and must stay stable.

use crate::constants::gas::NUM_O2_SENSORS;
use crate::constants::limits::{MAX_DEPTH_M, NUM_COMPARTMENTS};
use crate::deco::{DecoInfo, VpmState};
use crate::events::{Events, Position};
use crate::gas::{ActualGas, DecoAlgorithm, GasId};
use crate::settings::DiveSettings;

/// Operating mode of the computer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Not diving
    #[default]
    Surface,
    /// Dive in progress
    Dive,
}

/// Battery charger status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeStatus {
    /// Not reported yet
    #[default]
    Unknown,
    /// Running from battery
    Discharging,
    /// Charger connected
    Charging,
    /// Charger connected, battery full
    Full,
}

/// GNSS fix as reported by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GnssFix {
    /// Fix is valid
    pub valid: bool,
    /// Latitude (degrees)
    pub latitude: f32,
    /// Longitude (degrees)
    pub longitude: f32,
}

/// One telemetry sample from the sensing controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Surface or dive, as detected by the sensing controller
    pub mode: Mode,
    /// Ambient pressure (bar)
    pub pressure_ambient_bar: f32,
    /// Surface pressure (bar)
    pub pressure_surface_bar: f32,
    /// Depth (m)
    pub depth_m: f32,
    /// Dive time (s)
    pub dive_time_s: u32,
    /// Ascent rate (m/min), positive while ascending
    pub ascent_rate_m_min: f32,
    /// Water temperature (°C)
    pub temperature_c: f32,
    /// Tissue nitrogen pressure per compartment (bar)
    pub tissue_nitrogen_bar: [f32; NUM_COMPARTMENTS],
    /// Tissue helium pressure per compartment (bar)
    pub tissue_helium_bar: [f32; NUM_COMPARTMENTS],
    /// Compass heading (degrees)
    pub compass_heading_deg: f32,
    /// Battery voltage (V)
    pub battery_voltage: f32,
    /// Battery charge (%), zero when unknown
    pub battery_charge_percent: f32,
    /// CO2 sensor present and reporting
    pub co2_sensor_active: bool,
    /// CO2 level (ppm)
    pub co2_ppm: u16,
    /// O2 cell readings (bar)
    pub ppo2_sensor_bar: [f32; NUM_O2_SENSORS],
    /// O2 cell error bits reported by the sensing controller
    pub sensor_errors: u8,
    /// O2 cell data stopped arriving
    pub sensor_link_lost: bool,
    /// GNSS fix
    pub gnss: GnssFix,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            mode: Mode::Surface,
            pressure_ambient_bar: 1.0,
            pressure_surface_bar: 1.0,
            depth_m: 0.0,
            dive_time_s: 0,
            ascent_rate_m_min: 0.0,
            temperature_c: 20.0,
            tissue_nitrogen_bar: [0.75; NUM_COMPARTMENTS],
            tissue_helium_bar: [0.0; NUM_COMPARTMENTS],
            compass_heading_deg: 0.0,
            battery_voltage: 0.0,
            battery_charge_percent: 0.0,
            co2_sensor_active: false,
            co2_ppm: 0,
            ppo2_sensor_bar: [0.0; NUM_O2_SENSORS],
            sensor_errors: 0,
            sensor_link_lost: false,
            gnss: GnssFix::default(),
        }
    }
}

/// Per-tick telemetry plus derived values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifeData {
    /// Ambient pressure (bar)
    pub pressure_ambient_bar: f32,
    /// Surface pressure (bar)
    pub pressure_surface_bar: f32,
    /// Depth (m)
    pub depth_m: f32,
    /// Deepest depth this dive (m)
    pub max_depth_m: f32,
    /// Time-weighted average depth (m)
    pub average_depth_m: f32,
    /// Dive time (s)
    pub dive_time_s: u32,
    /// Ascent rate (m/min), positive while ascending
    pub ascent_rate_m_min: f32,
    /// Water temperature (°C)
    pub temperature_c: f32,
    /// Tissue nitrogen pressure per compartment (bar)
    pub tissue_nitrogen_bar: [f32; NUM_COMPARTMENTS],
    /// Tissue helium pressure per compartment (bar)
    pub tissue_helium_bar: [f32; NUM_COMPARTMENTS],
    /// Compass heading (degrees)
    pub compass_heading_deg: f32,
    /// Battery voltage (V)
    pub battery_voltage: f32,
    /// Battery charge (%), zero when unknown
    pub battery_charge_percent: f32,
    /// CO2 sensor present and reporting
    pub co2_sensor_active: bool,
    /// CO2 level (ppm)
    pub co2_ppm: u16,
    /// GNSS fix
    pub gnss: GnssFix,
    /// Inspired ppO2 (bar)
    pub ppo2_bar: f32,
    /// CNS oxygen toxicity (%)
    pub cns_percent: f32,
    /// Oxygen tolerance units
    pub otu: f32,
    /// Gas currently breathed
    pub actual_gas: ActualGas,
    /// Last diluent selected in loop mode
    pub last_diluent_id: GasId,
    /// Depth at which the last diluent was selected (m)
    pub last_diluent_depth_m: f32,
    /// O2 cell readings (bar)
    pub ppo2_sensor_bar: [f32; NUM_O2_SENSORS],
    /// O2 cell error bits, sticky as reported by the sensing controller
    pub sensor_errors: u8,
    /// O2 cell data stopped arriving
    pub sensor_link_lost: bool,
}

impl Default for LifeData {
    fn default() -> Self {
        Self {
            pressure_ambient_bar: 1.0,
            pressure_surface_bar: 1.0,
            depth_m: 0.0,
            max_depth_m: 0.0,
            average_depth_m: 0.0,
            dive_time_s: 0,
            ascent_rate_m_min: 0.0,
            temperature_c: 20.0,
            tissue_nitrogen_bar: [0.75; NUM_COMPARTMENTS],
            tissue_helium_bar: [0.0; NUM_COMPARTMENTS],
            compass_heading_deg: 0.0,
            battery_voltage: 0.0,
            battery_charge_percent: 0.0,
            co2_sensor_active: false,
            co2_ppm: 0,
            gnss: GnssFix::default(),
            ppo2_bar: 0.21,
            cns_percent: 0.0,
            otu: 0.0,
            actual_gas: ActualGas::default(),
            last_diluent_id: 0,
            last_diluent_depth_m: 0.0,
            ppo2_sensor_bar: [0.0; NUM_O2_SENSORS],
            sensor_errors: 0,
            sensor_link_lost: false,
        }
    }
}

impl LifeData {
    /// Copy one telemetry sample in and update the derived depth statistics
    ///
    /// Returns the dive time elapsed since the previous sample (s). Depth is
    /// clamped into the range the core accepts.
    pub fn apply_telemetry(&mut self, sample: &Telemetry) -> u32 {
        let previous_time_s = self.dive_time_s;
        let depth = if sample.depth_m.is_nan() {
            self.depth_m
        } else {
            sample.depth_m.clamp(0.0, MAX_DEPTH_M)
        };

        self.pressure_ambient_bar = sample.pressure_ambient_bar;
        self.pressure_surface_bar = sample.pressure_surface_bar;
        self.depth_m = depth;
        self.dive_time_s = sample.dive_time_s;
        self.ascent_rate_m_min = sample.ascent_rate_m_min;
        self.temperature_c = sample.temperature_c;
        self.tissue_nitrogen_bar = sample.tissue_nitrogen_bar;
        self.tissue_helium_bar = sample.tissue_helium_bar;
        self.compass_heading_deg = sample.compass_heading_deg;
        self.battery_voltage = sample.battery_voltage;
        self.battery_charge_percent = sample.battery_charge_percent;
        self.co2_sensor_active = sample.co2_sensor_active;
        self.co2_ppm = sample.co2_ppm;
        self.gnss = sample.gnss;
        self.ppo2_sensor_bar = sample.ppo2_sensor_bar;
        self.sensor_errors = sample.sensor_errors;
        self.sensor_link_lost = sample.sensor_link_lost;

        if depth > self.max_depth_m {
            self.max_depth_m = depth;
        }

        let dt_s = sample.dive_time_s.saturating_sub(previous_time_s);
        if sample.dive_time_s > 0 && dt_s > 0 {
            let total = sample.dive_time_s as f32;
            self.average_depth_m =
                (self.average_depth_m * previous_time_s as f32 + depth * dt_s as f32) / total;
        }
        dt_s
    }

    /// Mean of the O2 cells not excluded by `deactivated` and not in error
    ///
    /// Zero when no cell is usable.
    pub fn ppo2_sensor_mean_bar(&self, deactivated: u8) -> f32 {
        let mut sum = 0.0;
        let mut count = 0u8;
        for (i, value) in self.ppo2_sensor_bar.iter().enumerate() {
            let mask = 1u8 << i;
            if deactivated & mask == 0 && self.sensor_errors & mask == 0 {
                sum += *value;
                count += 1;
            }
        }
        if count == 0 { 0.0 } else { sum / count as f32 }
    }
}

/// Warning flags, fully recomputed every tick
///
/// `num_warnings` equals the sum of every other flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Warnings {
    /// Shallower than the next required stop
    pub deco_missed: i8,
    /// ppO2 below the configured minimum
    pub ppo2_low: i8,
    /// ppO2 above the configured ceiling
    pub ppo2_high: i8,
    /// Ascending faster than allowed
    pub ascent_rate_high: i8,
    /// CNS above the configured level
    pub cns_high: i8,
    /// O2 cell data stopped arriving
    pub sensor_link_lost: i8,
    /// Per O2 cell: reading implausible or cell in error
    pub sensor_out_of_bounds: [i8; NUM_O2_SENSORS],
    /// A better gas is available
    pub better_gas: i8,
    /// A better setpoint is available
    pub better_setpoint: i8,
    /// Fallback to fixed setpoint is active
    pub fallback: i8,
    /// Battery almost empty
    pub low_battery: i8,
    /// CO2 above the alarm level
    pub co2_high: i8,
    /// Sum of all flags above
    pub num_warnings: i8,
}

impl Warnings {
    /// Sum of the flags that may drive the buzzer
    pub fn buzzer_eligible(&self) -> i8 {
        self.ascent_rate_high
            + self.deco_missed
            + self.ppo2_low
            + self.ppo2_high
            + self.sensor_link_lost
            + self.sensor_out_of_bounds.iter().sum::<i8>()
            + self.fallback
            + self.co2_high
    }

    /// Sum of all individual flags
    pub fn sum_of_flags(&self) -> i8 {
        self.deco_missed
            + self.ppo2_low
            + self.ppo2_high
            + self.ascent_rate_high
            + self.cns_high
            + self.sensor_link_lost
            + self.sensor_out_of_bounds.iter().sum::<i8>()
            + self.better_gas
            + self.better_setpoint
            + self.fallback
            + self.low_battery
            + self.co2_high
    }
}

/// Stopwatch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    /// Not running
    #[default]
    Off,
    /// Counting down
    Running,
    /// Countdown elapsed
    Finished,
}

/// Dive stopwatch driven by dive time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiveTimer {
    /// Current state
    pub state: TimerState,
    /// Dive time at start (s)
    pub started_at_s: u32,
}

impl DiveTimer {
    /// Start counting from `dive_time_s`
    pub fn start(&mut self, dive_time_s: u32) {
        self.state = TimerState::Running;
        self.started_at_s = dive_time_s;
    }

    /// Advance with the current dive time
    pub fn update(&mut self, dive_time_s: u32, duration_s: u16) {
        if self.state == TimerState::Running
            && dive_time_s.saturating_sub(self.started_at_s) >= duration_s as u32
        {
            self.state = TimerState::Finished;
        }
    }

    /// Seconds left, zero unless running
    pub fn remaining_s(&self, dive_time_s: u32, duration_s: u16) -> u32 {
        match self.state {
            TimerState::Running => {
                (duration_s as u32).saturating_sub(dive_time_s.saturating_sub(self.started_at_s))
            }
            _ => 0,
        }
    }

    /// Immediate reset
    pub fn disable(&mut self) {
        *self = DiveTimer::default();
    }
}

/// Aggregate dive state
#[derive(Debug, Clone, PartialEq)]
pub struct DiveState {
    /// Per-dive settings snapshot
    pub settings: DiveSettings,
    /// Telemetry and derived values
    pub life: LifeData,
    /// VPM bubble model accumulators
    pub vpm: VpmState,
    /// One-shot log events
    pub events: Events,
    /// Warning flags
    pub warnings: Warnings,
    /// Current plan, Bühlmann
    pub deco_buehlmann: DecoInfo,
    /// Current plan, VPM
    pub deco_vpm: DecoInfo,
    /// Plan after the configured future time, Bühlmann
    pub deco_future_buehlmann: DecoInfo,
    /// Plan after the configured future time, VPM
    pub deco_future_vpm: DecoInfo,
    /// Surface or dive
    pub mode: Mode,
    /// Charger status
    pub charge_status: ChargeStatus,
    /// Dive stopwatch
    pub timer: DiveTimer,
}

impl Default for DiveState {
    fn default() -> Self {
        Self {
            settings: DiveSettings::default(),
            life: LifeData::default(),
            vpm: VpmState::default(),
            events: Events::default(),
            warnings: Warnings::default(),
            deco_buehlmann: DecoInfo::default(),
            deco_vpm: DecoInfo::default(),
            deco_future_buehlmann: DecoInfo::default(),
            deco_future_vpm: DecoInfo::default(),
            mode: Mode::Surface,
            charge_status: ChargeStatus::Unknown,
            timer: DiveTimer::default(),
        }
    }
}

impl DiveState {
    /// Current plan of the configured algorithm
    pub fn deco_info(&self) -> &DecoInfo {
        match self.settings.deco_type.active() {
            DecoAlgorithm::Gf => &self.deco_buehlmann,
            DecoAlgorithm::Vpm => &self.deco_vpm,
        }
    }

    /// Future plan of the configured algorithm
    pub fn future_deco_info(&self) -> &DecoInfo {
        match self.settings.deco_type.active() {
            DecoAlgorithm::Gf => &self.deco_future_buehlmann,
            DecoAlgorithm::Vpm => &self.deco_future_vpm,
        }
    }

    /// Forget every published plan
    pub fn clear_deco_info(&mut self) {
        self.deco_buehlmann = DecoInfo::default();
        self.deco_vpm = DecoInfo::default();
        self.deco_future_buehlmann = DecoInfo::default();
        self.deco_future_vpm = DecoInfo::default();
    }

    /// Latch the diver's marker button
    pub fn mark_manual(&mut self) {
        self.events.manual_marker = true;
    }

    /// Latch the current compass heading
    pub fn mark_heading(&mut self) {
        let heading = libm::roundf(self.life.compass_heading_deg) as i32;
        self.events.compass_heading = Some(heading.rem_euclid(360) as u16);
    }

    /// Latch the current GNSS position if the fix is valid
    pub fn mark_position(&mut self) -> bool {
        if !self.life.gnss.valid {
            return false;
        }
        self.events.gnss_position = Some(Position {
            latitude: self.life.gnss.latitude,
            longitude: self.life.gnss.longitude,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::{DecoType, DecoAlgorithm};

    #[test]
    fn telemetry_clamps_depth_and_tracks_max() {
        let mut life = LifeData::default();
        life.apply_telemetry(&Telemetry { depth_m: 30.0, dive_time_s: 60, ..Telemetry::default() });
        life.apply_telemetry(&Telemetry { depth_m: 300.0, dive_time_s: 70, ..Telemetry::default() });
        assert_eq!(life.depth_m, MAX_DEPTH_M);
        assert_eq!(life.max_depth_m, MAX_DEPTH_M);

        life.apply_telemetry(&Telemetry { depth_m: -2.0, dive_time_s: 80, ..Telemetry::default() });
        assert_eq!(life.depth_m, 0.0);
        assert_eq!(life.max_depth_m, MAX_DEPTH_M);
    }

    #[test]
    fn average_depth_is_time_weighted() {
        let mut life = LifeData::default();
        life.apply_telemetry(&Telemetry { depth_m: 10.0, dive_time_s: 60, ..Telemetry::default() });
        let dt = life.apply_telemetry(&Telemetry { depth_m: 30.0, dive_time_s: 120, ..Telemetry::default() });
        assert_eq!(dt, 60);
        assert!((life.average_depth_m - 20.0).abs() < 1e-4);
    }

    #[test]
    fn sensor_mean_skips_excluded_cells() {
        let life = LifeData {
            ppo2_sensor_bar: [1.2, 1.0, 0.2],
            sensor_errors: 0b100,
            ..LifeData::default()
        };
        assert!((life.ppo2_sensor_mean_bar(0) - 1.1).abs() < 1e-6);
        assert!((life.ppo2_sensor_mean_bar(0b001) - 1.0).abs() < 1e-6);
        assert_eq!(life.ppo2_sensor_mean_bar(0b011), 0.0);
    }

    #[test]
    fn deco_info_follows_algorithm() {
        let mut state = DiveState::default();
        state.deco_vpm.ndl_s = 42;
        assert_eq!(state.deco_info().ndl_s, 0);

        state.settings.deco_type = DecoType { standard: DecoAlgorithm::Vpm, alternative: DecoAlgorithm::Gf };
        assert_eq!(state.deco_info().ndl_s, 42);
    }

    #[test]
    fn timer_runs_and_disables() {
        let mut timer = DiveTimer::default();
        timer.start(100);
        timer.update(200, 180);
        assert_eq!(timer.state, TimerState::Running);
        assert_eq!(timer.remaining_s(200, 180), 80);

        timer.update(280, 180);
        assert_eq!(timer.state, TimerState::Finished);

        timer.disable();
        assert_eq!(timer, DiveTimer::default());
    }

    #[test]
    fn heading_marker_wraps() {
        let mut state = DiveState::default();
        state.life.compass_heading_deg = 359.7;
        state.mark_heading();
        assert_eq!(state.events.compass_heading, Some(0));

        assert!(!state.mark_position());
        assert!(state.events.gnss_position.is_none());
    }
}
