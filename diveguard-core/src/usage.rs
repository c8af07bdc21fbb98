//! Device-lifetime usage record
//!
//! Created once at firmware init and updated for the whole life of the
//! device, not per dive. Every extreme carries the epoch-seconds timestamp of
//! when it was set.

use crate::state::LifeData;

/// One lifetime extreme and when it was reached
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extreme<T> {
    /// Extreme value
    pub value: T,
    /// Epoch seconds when it was recorded, zero if never
    pub at_epoch_s: u32,
}

impl<T: Copy + PartialOrd> Extreme<T> {
    fn raise(&mut self, value: T, epoch_s: u32) -> bool {
        if self.at_epoch_s == 0 || value > self.value {
            self.value = value;
            self.at_epoch_s = epoch_s;
            return true;
        }
        false
    }

    fn lower(&mut self, value: T, epoch_s: u32) -> bool {
        if self.at_epoch_s == 0 || value < self.value {
            self.value = value;
            self.at_epoch_s = epoch_s;
            return true;
        }
        false
    }
}

/// Lifetime extremes of the device
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceUsage {
    /// Deepest depth (m)
    pub max_depth_m: Extreme<f32>,
    /// Lowest water temperature (°C)
    pub min_temperature_c: Extreme<f32>,
    /// Highest water temperature (°C)
    pub max_temperature_c: Extreme<f32>,
    /// Lowest battery voltage under use (V)
    pub min_battery_voltage: Extreme<f32>,
    /// Longest dive (s)
    pub longest_dive_s: Extreme<u32>,
    /// Dives started
    pub dive_count: u16,
}

impl DeviceUsage {
    /// Fold the current life data into the lifetime extremes
    ///
    /// Returns true when any extreme changed. A zero timestamp means the
    /// wall clock is not set yet; nothing is recorded then. A zero battery
    /// voltage means the reading is not available.
    pub fn record(&mut self, life: &LifeData, epoch_s: u32) -> bool {
        if epoch_s == 0 {
            return false;
        }

        let mut changed = false;
        if self.max_depth_m.raise(life.depth_m, epoch_s) {
            log_info!("New lifetime max depth {} m", life.depth_m);
            changed = true;
        }
        changed |= self.min_temperature_c.lower(life.temperature_c, epoch_s);
        changed |= self.max_temperature_c.raise(life.temperature_c, epoch_s);
        if life.battery_voltage > 0.0 {
            changed |= self.min_battery_voltage.lower(life.battery_voltage, epoch_s);
        }
        if self.longest_dive_s.raise(life.dive_time_s, epoch_s) && life.dive_time_s > 0 {
            log_info!("New lifetime longest dive {} s", life.dive_time_s);
            changed = true;
        }
        changed
    }

    /// Count one more dive
    pub fn start_dive(&mut self) {
        self.dive_count = self.dive_count.saturating_add(1);
    }
}
