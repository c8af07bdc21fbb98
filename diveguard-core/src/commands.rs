//! Outbound requests to the sensing controller
//!
//! Fire and forget: every request kind owns one slot that holds the latest
//! payload. Requesting again before the transport picked it up overwrites the
//! payload. No acknowledgement is modelled.

/// Wall-clock date and time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    /// Year, e.g. 2025
    pub year: u16,
    /// Month 1..=12
    pub month: u8,
    /// Day 1..=31
    pub day: u8,
    /// Hour 0..=23
    pub hour: u8,
    /// Minute 0..=59
    pub minute: u8,
    /// Second 0..=59
    pub second: u8,
}

/// A request handed to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    /// Button sensitivity (%)
    ButtonSensitivity(u8),
    /// Set the real time clock
    SetDateTime(DateTime),
    /// Battery gauge calibration value (%)
    BatteryGauge(u8),
    /// Start compass calibration
    CalibrateCompass,
    /// Drop tissue loading on the sensing side
    ClearDeco,
}

/// Pending requests, one slot per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorCommands {
    button_sensitivity: Option<u8>,
    date_time: Option<DateTime>,
    battery_gauge: Option<u8>,
    calibrate_compass: bool,
    clear_deco: bool,
}

impl SensorCommands {
    /// Queue a request, replacing any pending one of the same kind
    pub fn request(&mut self, command: SensorCommand) {
        log_debug!("Queued sensor command {:?}", command);
        match command {
            SensorCommand::ButtonSensitivity(value) => self.button_sensitivity = Some(value),
            SensorCommand::SetDateTime(value) => self.date_time = Some(value),
            SensorCommand::BatteryGauge(value) => self.battery_gauge = Some(value),
            SensorCommand::CalibrateCompass => self.calibrate_compass = true,
            SensorCommand::ClearDeco => self.clear_deco = true,
        }
    }

    /// Any request pending
    pub fn is_pending(&self) -> bool {
        *self != SensorCommands::default()
    }

    /// Hand the next pending request to the transport
    ///
    /// Clear deco goes first, the rest in declaration order.
    pub fn take(&mut self) -> Option<SensorCommand> {
        if core::mem::take(&mut self.clear_deco) {
            return Some(SensorCommand::ClearDeco);
        }
        if let Some(value) = self.button_sensitivity.take() {
            return Some(SensorCommand::ButtonSensitivity(value));
        }
        if let Some(value) = self.date_time.take() {
            return Some(SensorCommand::SetDateTime(value));
        }
        if let Some(value) = self.battery_gauge.take() {
            return Some(SensorCommand::BatteryGauge(value));
        }
        if core::mem::take(&mut self.calibrate_compass) {
            return Some(SensorCommand::CalibrateCompass);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_overwrites_payload() {
        let mut commands = SensorCommands::default();
        commands.request(SensorCommand::ButtonSensitivity(40));
        commands.request(SensorCommand::ButtonSensitivity(70));

        assert_eq!(commands.take(), Some(SensorCommand::ButtonSensitivity(70)));
        assert_eq!(commands.take(), None);
        assert!(!commands.is_pending());
    }

    #[test]
    fn clear_deco_drains_first() {
        let mut commands = SensorCommands::default();
        commands.request(SensorCommand::CalibrateCompass);
        commands.request(SensorCommand::ClearDeco);

        assert_eq!(commands.take(), Some(SensorCommand::ClearDeco));
        assert_eq!(commands.take(), Some(SensorCommand::CalibrateCompass));
        assert_eq!(commands.take(), None);
    }
}
