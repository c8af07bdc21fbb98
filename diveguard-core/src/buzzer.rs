//! Buzzer debounce state machine
//!
//! Turns "some buzzer-eligible warning is pending" into a physical on/off
//! signal without rattling.
//!
//! ```text
//!            warning ∧ stable ∧ rearmed ∧ (¬mute ∨ reminder due)
//!     ┌─────┐ ───────────────────────────────────────────────▶ ┌────┐
//!     │ OFF │                                                  │ ON │
//!     └─────┘ ◀─────────────────────────────────────────────── └────┘
//!               stable ∧ (mute ∨ on-time ≥ max)   or   ¬warning
//! ```
//!
//! - **stable**: at least [`BUZZER_MIN_STABLE_MS`] since the last change
//! - **rearmed**: after a forced off, [`BUZZER_REARM_IDLE_MS`] of idle
//! - **reminder due**: a muted buzzer comes back for one short beep once the
//!   mute window has passed since the mute began or the last reminder
//!
//! The all-clear transition is immediate and not debounced.

use crate::constants::time::{BUZZER_MAX_ON_MS, BUZZER_MIN_STABLE_MS, BUZZER_REARM_IDLE_MS};
use crate::time::{elapsed_ms, Tick};

/// Physical buzzer output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuzzerState {
    /// Silent
    #[default]
    Off,
    /// Sounding
    On,
}

#[cfg(feature = "defmt")]
impl defmt::Format for BuzzerState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            BuzzerState::Off => defmt::write!(fmt, "Off"),
            BuzzerState::On => defmt::write!(fmt, "On"),
        }
    }
}

/// Buzzer hysteresis with minimum stable time and maximum on-time
#[derive(Debug, Clone, Default)]
pub struct BuzzerDebouncer {
    state: BuzzerState,
    last_change: Option<Tick>,
    forced_off: bool,
    mute_window_start: Option<Tick>,
}

impl BuzzerDebouncer {
    /// Silent debouncer that may switch on at the first warning
    pub const fn new() -> Self {
        Self {
            state: BuzzerState::Off,
            last_change: None,
            forced_off: false,
            mute_window_start: None,
        }
    }

    /// Current output
    pub fn state(&self) -> BuzzerState {
        self.state
    }

    /// Tick of the last state change, `None` before the first one
    pub fn last_change(&self) -> Option<Tick> {
        self.last_change
    }

    /// Advance the machine and return the new output
    pub fn update(&mut self, now: Tick, warning_present: bool, mute: bool) -> BuzzerState {
        if !mute {
            self.mute_window_start = None;
        }

        if !warning_present {
            if self.state == BuzzerState::On {
                self.switch(BuzzerState::Off, now);
                self.forced_off = false;
            }
            return self.state;
        }

        let since_change = self.last_change.map(|at| elapsed_ms(at, now));
        if since_change.is_some_and(|elapsed| elapsed < BUZZER_MIN_STABLE_MS) {
            return self.state;
        }

        match self.state {
            BuzzerState::Off => {
                if self.forced_off
                    && since_change.is_some_and(|elapsed| elapsed < BUZZER_REARM_IDLE_MS)
                {
                    return self.state;
                }
                if mute {
                    let start = *self.mute_window_start.get_or_insert(now);
                    if elapsed_ms(start, now) < BUZZER_REARM_IDLE_MS {
                        return self.state;
                    }
                    // Reminder beep, next window starts now
                    self.mute_window_start = Some(now);
                }
                self.forced_off = false;
                self.switch(BuzzerState::On, now);
            }
            BuzzerState::On => {
                if mute {
                    self.mute_window_start = Some(now);
                    self.forced_off = false;
                    self.switch(BuzzerState::Off, now);
                } else if since_change.is_some_and(|elapsed| elapsed >= BUZZER_MAX_ON_MS) {
                    self.forced_off = true;
                    self.switch(BuzzerState::Off, now);
                }
            }
        }
        self.state
    }

    fn switch(&mut self, state: BuzzerState, now: Tick) {
        log_debug!("Buzzer {:?} -> {:?} at {}", self.state, state, now);
        self.state = state;
        self.last_change = Some(now);
    }
}
