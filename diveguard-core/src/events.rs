//! One-shot dive log markers
//!
//! ## Overview
//!
//! The dive logger samples the active dive state at its own pace. Things that
//! happen between two samples (a gas switch, a bailout, the diver pressing the
//! marker button) must not get lost, so they are latched into [`Events`] and
//! stay there until the logger has consumed them and calls `reset`.
//!
//! ```text
//! selector / menu ──set──▶ Events ──pending()──▶ logger ──reset()──▶ Events::default()
//! ```
//!
//! Events are write-once-then-consumed. There is no timeout: an event that
//! nobody drains stays latched, and writing the same kind again simply
//! overwrites the payload.

use heapless::Vec;

use crate::gas::GasId;

/// Number of distinct event kinds
pub const NUM_EVENT_KINDS: usize = 7;

/// Payload of a bailout to open circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BailoutInfo {
    /// Oxygen share of the bailout gas (%)
    pub oxygen_percent: u8,
    /// Helium share of the bailout gas (%)
    pub helium_percent: u8,
}

/// GNSS position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Latitude (degrees)
    pub latitude: f32,
    /// Longitude (degrees)
    pub longitude: f32,
}

/// Latched one-shot events
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Events {
    /// Switched to another gas table slot
    pub gas_change: Option<GasId>,
    /// Setpoint changed (cbar)
    pub setpoint_change: Option<u8>,
    /// Left the loop for an open circuit gas
    pub bailout: Option<BailoutInfo>,
    /// Diver entered a gas by hand
    pub manual_gas_set: Option<BailoutInfo>,
    /// Diver pressed the marker button
    pub manual_marker: bool,
    /// Compass heading was stored (degrees)
    pub compass_heading: Option<u16>,
    /// GNSS position was stored
    pub gnss_position: Option<Position>,
}

/// A single event as handed to the logger
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogEvent {
    /// Gas change to a table slot
    GasChange(GasId),
    /// Setpoint change (cbar)
    SetpointChange(u8),
    /// Bailout to open circuit
    Bailout(BailoutInfo),
    /// Manually entered gas
    ManualGasSet(BailoutInfo),
    /// Marker button
    ManualMarker,
    /// Compass heading (degrees)
    CompassHeading(u16),
    /// GNSS position
    GnssPosition(Position),
}

impl LogEvent {
    /// Logger priority, lower numbers first
    ///
    /// Bailout goes first so a full log block never drops it.
    pub fn priority(&self) -> u8 {
        match self {
            LogEvent::Bailout(_) => 0,
            LogEvent::GasChange(_) | LogEvent::ManualGasSet(_) => 1,
            LogEvent::SetpointChange(_) => 2,
            LogEvent::ManualMarker => 3,
            LogEvent::CompassHeading(_) | LogEvent::GnssPosition(_) => 4,
        }
    }
}

impl Events {
    /// No event latched
    pub fn is_empty(&self) -> bool {
        *self == Events::default()
    }

    /// Latched events ordered by logger priority
    pub fn pending(&self) -> Vec<LogEvent, NUM_EVENT_KINDS> {
        let mut out: Vec<LogEvent, NUM_EVENT_KINDS> = Vec::new();
        // One slot per kind, capacity cannot be exceeded
        let candidates = [
            self.bailout.map(LogEvent::Bailout),
            self.gas_change.map(LogEvent::GasChange),
            self.manual_gas_set.map(LogEvent::ManualGasSet),
            self.setpoint_change.map(LogEvent::SetpointChange),
            self.manual_marker.then_some(LogEvent::ManualMarker),
            self.compass_heading.map(LogEvent::CompassHeading),
            self.gnss_position.map(LogEvent::GnssPosition),
        ];
        for event in candidates.into_iter().flatten() {
            let _ = out.push(event);
        }
        out.sort_unstable_by_key(|event| event.priority());
        out
    }

    /// Clear everything after the logger consumed it
    pub fn reset(&mut self) {
        *self = Events::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        assert!(Events::default().is_empty());
        assert!(Events::default().pending().is_empty());
    }

    #[test]
    fn pending_orders_by_priority() {
        let events = Events {
            gas_change: Some(2),
            manual_marker: true,
            bailout: Some(BailoutInfo { oxygen_percent: 32, helium_percent: 0 }),
            ..Events::default()
        };

        let pending = events.pending();
        assert_eq!(pending.len(), 3);
        assert!(matches!(pending[0], LogEvent::Bailout(_)));
        assert_eq!(pending[1], LogEvent::GasChange(2));
        assert_eq!(pending[2], LogEvent::ManualMarker);
    }

    #[test]
    fn reset_clears_latches() {
        let mut events = Events { setpoint_change: Some(130), ..Events::default() };
        events.reset();
        assert!(events.is_empty());
    }
}
