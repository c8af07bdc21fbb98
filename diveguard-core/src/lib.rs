//! Dive state and safety monitoring core for DiveGuard
//!
//! Tracks the diver's gas and physiological state, picks the current and
//! the "better" breathing gas and setpoint, integrates VPM crushing pressure
//! and raises debounced safety warnings once per control-loop tick.
//!
//! Key constraints:
//! - Runs to completion every tick, never blocks
//! - No heap allocation in the tick path
//! - Nothing in here is fatal: faults surface as warning flags
//!
//! ```no_run
//! use diveguard_core::{DiveStateStore, Settings, Telemetry};
//! use diveguard_core::deco::NoDecoModel;
//!
//! let model = NoDecoModel;
//! let mut store = DiveStateStore::new();
//! store.create_dive_settings(&Settings::default(), &model);
//!
//! // Every tick: fresh telemetry in, warnings out
//! store.ingest_telemetry(&Telemetry::default(), &model, 0);
//! let report = store.tick(&model, 1000, false);
//! assert_eq!(report.num_warnings, store.real().warnings.num_warnings);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod buzzer;
pub mod commands;
pub mod constants;
pub mod deco;
pub mod errors;
pub mod events;
pub mod gas;
pub mod selector;
pub mod settings;
pub mod state;
pub mod store;
pub mod time;
pub mod usage;
pub mod vpm;
pub mod warnings;

// Public API
pub use buzzer::{BuzzerDebouncer, BuzzerState};
pub use commands::{SensorCommand, SensorCommands};
pub use deco::{DecoInfo, DecoModel};
pub use errors::{StateError, StateResult};
pub use events::{Events, LogEvent};
pub use gas::{ActualGas, CcrMode, DiveMode, GasId};
pub use selector::GasSetpointSelector;
pub use settings::{ConfigProvider, DiveSettings, Settings};
pub use state::{DiveState, LifeData, Mode, Telemetry, Warnings};
pub use store::{DecoLock, DiveStateStore, TickReport, View};
pub use time::{Tick, TickSource};
pub use usage::DeviceUsage;
pub use vpm::VpmCrushIntegrator;
pub use warnings::WarningEngine;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
