//! Gas and setpoint selection
//!
//! ## Actual gas
//!
//! [`set_actual_gas`] turns a gas table slot into the [`ActualGas`] record
//! the decompression model breathes. [`set_actual_gas_dm`] and
//! [`set_actual_gas_extra_gas`] wrap it for the dive menu: they handle
//! bailout and write one-shot log events, edge-triggered on a real change.
//!
//! ## Better gas
//!
//! [`get_better_gas_id`] proposes the gas the diver should be breathing:
//!
//! ```text
//! obligation pending and shallower than the deco zone start
//!     deco gases whose switch depth ≥ depth - 0.9 m  ──▶ shallowest one
//! otherwise (travel phase)
//!     travel/first gases with travel depth ≤ depth + 0.01 m  ──▶ deepest one
//! no match  ──▶ starting id unchanged
//! ```
//!
//! ## Better setpoint
//!
//! Loop only. With auto-setpoint the switch is applied directly (low near the
//! surface, high at depth, deco once close to the next stop). Without it the
//! deepest active setpoint the diver is already below is proposed through
//! `warnings.better_setpoint`.

use crate::constants::deco::{
    DECO_GAS_SWITCH_MARGIN_M, DECO_SETPOINT_BAND_M, TRAVEL_GAS_SWITCH_MARGIN_M,
};
use crate::constants::gas::{
    EXTRA_GAS_ID, MAX_GAS_ID, NUM_GASES, NUM_OFFSET_DILUENT, SETPOINT_ID_AUTO_DECO,
    SETPOINT_ID_AUTO_HIGH, SETPOINT_ID_AUTO_LOW, SETPOINT_TABLE_LEN,
};
use crate::events::BailoutInfo;
use crate::gas::{is_diluent_id, is_oc_id, ActualGas, DiveMode, GasId, GasSlot};
use crate::settings::DiveSettings;
use crate::state::{DiveState, LifeData, Mode};

/// Apply a gas table slot as the breathed gas
///
/// The id is clamped into the table. The setpoint is only kept in loop
/// modes. In a loop mode a diluent id is remembered together with the depth
/// it was selected at.
pub fn set_actual_gas(life: &mut LifeData, settings: &DiveSettings, gas_id: GasId, setpoint_cbar: u8) {
    let id = gas_id.min(MAX_GAS_ID);
    let slot = settings.gas_clamped(id);

    let oxygen = slot.oxygen_percent.min(100);
    let helium = slot.helium_percent.min(100 - oxygen);
    let loop_mode = settings.dive_mode.is_loop();

    life.actual_gas = ActualGas {
        nitrogen_percent: 100 - oxygen - helium,
        helium_percent: helium,
        setpoint_cbar: if loop_mode { setpoint_cbar } else { 0 },
        gas_id: id,
        applied_dive_mode: settings.dive_mode,
        pscr_factor: settings.pscr_factor(),
    };

    if loop_mode && id as usize > NUM_OFFSET_DILUENT {
        life.last_diluent_id = id;
        life.last_diluent_depth_m = life.depth_m;
    }
}

/// Menu gas switch with bailout handling and change events
///
/// Selecting an open circuit gas while on CCR bails out: the dive mode
/// becomes open circuit and a bailout event is written instead of a gas
/// change. Selecting a diluent after a bailout returns to the loop when the
/// rebreather is still available.
pub fn set_actual_gas_dm(state: &mut DiveState, gas_id: GasId, setpoint_cbar: u8) {
    let id = gas_id.min(MAX_GAS_ID);
    let before = state.life.actual_gas;
    let mut bailout = false;

    if state.settings.dive_mode == DiveMode::Ccr && is_oc_id(id) {
        log_info!("Bailout from {:?} to gas {}", state.settings.dive_mode, id);
        state.settings.dive_mode = DiveMode::Oc;
        bailout = true;
    } else if state.settings.dive_mode == DiveMode::Oc
        && state.settings.ccr_option
        && is_diluent_id(id)
    {
        log_info!("Back on the loop with diluent {}", id);
        state.settings.dive_mode = DiveMode::Ccr;
    }

    set_actual_gas(&mut state.life, &state.settings, id, setpoint_cbar);
    let after = state.life.actual_gas;

    if bailout {
        state.events.bailout = Some(BailoutInfo {
            oxygen_percent: after.oxygen_percent(),
            helium_percent: after.helium_percent,
        });
    } else if after.gas_id != before.gas_id || !same_mix(&after, &before) {
        log_info!("Gas change to {}", id);
        state.events.gas_change = Some(id);
    }

    if after.setpoint_cbar != before.setpoint_cbar && after.setpoint_cbar != 0 {
        log_info!("Setpoint change to {} cbar", after.setpoint_cbar);
        state.events.setpoint_change = Some(after.setpoint_cbar);
    }
}

/// Switch to a manually entered gas
///
/// The mix goes into the extra slot 0. On CCR this is a bailout.
pub fn set_actual_gas_extra_gas(state: &mut DiveState, oxygen_percent: u8, helium_percent: u8) {
    let before = state.life.actual_gas;
    let mut slot = GasSlot::new(oxygen_percent.min(100), helium_percent);
    slot.helium_percent = slot.helium_percent.min(100 - slot.oxygen_percent);
    state.settings.gas[EXTRA_GAS_ID as usize] = slot;

    let bailout = state.settings.dive_mode == DiveMode::Ccr;
    if bailout {
        log_info!("Bailout from {:?} to extra gas", state.settings.dive_mode);
        state.settings.dive_mode = DiveMode::Oc;
    }

    set_actual_gas(&mut state.life, &state.settings, EXTRA_GAS_ID, 0);
    let after = state.life.actual_gas;
    let info = BailoutInfo {
        oxygen_percent: after.oxygen_percent(),
        helium_percent: after.helium_percent,
    };

    if bailout {
        state.events.bailout = Some(info);
    }
    if after.gas_id != before.gas_id || !same_mix(&after, &before) {
        state.events.manual_gas_set = Some(info);
    }
}

fn same_mix(a: &ActualGas, b: &ActualGas) -> bool {
    a.nitrogen_percent == b.nitrogen_percent && a.helium_percent == b.helium_percent
}

/// Propose the gas the diver should be breathing
///
/// Scans the diluent range when `want_diluent` is set, the open circuit range
/// otherwise. Never leaves the table; returns `starting_id` when nothing
/// qualifies.
pub fn get_better_gas_id(want_diluent: bool, starting_id: GasId, state: &DiveState) -> GasId {
    let settings = &state.settings;
    let depth = state.life.depth_m;
    let deco = state.deco_info();
    let offset = if want_diluent { NUM_OFFSET_DILUENT } else { 0 };

    let mut best: Option<(GasId, f32)> = None;

    if deco.has_obligation() && depth <= deco.deco_zone_start_m {
        for id in offset + 1..=offset + NUM_GASES {
            let slot = &settings.gas[id];
            if !slot.is_usable() {
                continue;
            }
            let switch_depth = if slot.note.deco && slot.depth_m > 0 {
                slot.depth_m as f32
            } else if settings.dive_mode == DiveMode::Pscr && slot.note.first {
                slot.mod_m(settings.ppo2_max_deco_cbar)
            } else {
                continue;
            };
            if switch_depth >= depth - DECO_GAS_SWITCH_MARGIN_M
                && best.map_or(true, |(_, best_depth)| switch_depth < best_depth)
            {
                best = Some((id as GasId, switch_depth));
            }
        }
    } else {
        for id in offset + 1..=offset + NUM_GASES {
            let slot = &settings.gas[id];
            if !slot.is_usable() || !(slot.note.travel || slot.note.first) {
                continue;
            }
            let travel_depth = slot.travel_depth_m as f32;
            if travel_depth <= depth + TRAVEL_GAS_SWITCH_MARGIN_M
                && best.map_or(true, |(_, best_depth)| travel_depth > best_depth)
            {
                best = Some((id as GasId, travel_depth));
            }
        }
    }

    let mut gas_id = best.map_or(starting_id, |(id, _)| id).min(MAX_GAS_ID);
    if !want_diluent && is_diluent_id(gas_id) {
        if let Some(first) = settings.first_gas_id(false) {
            gas_id = first;
        }
    }
    gas_id
}

/// Advisory state of the gas and setpoint selection
#[derive(Debug, Clone, Default)]
pub struct GasSetpointSelector {
    better_gas_id: GasId,
    better_bailout_gas_id: GasId,
    better_setpoint_id: u8,
    setpoint_low_delayed: bool,
    setpoint_deco_activated: bool,
}

impl GasSetpointSelector {
    /// Selector with no advisory
    pub const fn new() -> Self {
        Self {
            better_gas_id: 0,
            better_bailout_gas_id: 0,
            better_setpoint_id: 0,
            setpoint_low_delayed: false,
            setpoint_deco_activated: false,
        }
    }

    /// Forget everything from the previous dive
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Better gas (diluent on the loop)
    pub fn actual_better_gas_id(&self) -> GasId {
        self.better_gas_id
    }

    /// Better open circuit bailout gas, loop only
    pub fn actual_better_bailout_gas_id(&self) -> GasId {
        self.better_bailout_gas_id
    }

    /// Better setpoint slot
    pub fn actual_better_setpoint_id(&self) -> u8 {
        self.better_setpoint_id
    }

    /// Low setpoint switch is held back by a pending stop
    pub fn setpoint_low_delayed(&self) -> bool {
        self.setpoint_low_delayed
    }

    /// Deco setpoint was applied this dive
    pub fn setpoint_deco_activated(&self) -> bool {
        self.setpoint_deco_activated
    }

    /// Recompute the better gas and raise `warnings.better_gas`
    ///
    /// Only a different mix warns; another slot with the same O2/He does not.
    pub fn check_better_gas(&mut self, state: &mut DiveState) -> i8 {
        state.warnings.better_gas = 0;
        if state.mode != Mode::Dive || !tracks_gas(state.settings.dive_mode) {
            return 0;
        }

        let actual = state.life.actual_gas;
        if state.settings.dive_mode == DiveMode::Ccr {
            self.better_gas_id = get_better_gas_id(true, actual.gas_id, state);
            let bailout_start = state.settings.first_gas_id(false).unwrap_or(1);
            self.better_bailout_gas_id = get_better_gas_id(false, bailout_start, state);
        } else {
            self.better_gas_id = get_better_gas_id(false, actual.gas_id, state);
        }

        let better = state.settings.gas_clamped(self.better_gas_id);
        if better.oxygen_percent != actual.oxygen_percent()
            || better.helium_percent != actual.helium_percent
        {
            state.warnings.better_gas = 1;
        }
        state.warnings.better_gas
    }

    /// Recompute the better setpoint, apply it in auto mode
    pub fn check_better_setpoint(&mut self, state: &mut DiveState) -> i8 {
        state.warnings.better_setpoint = 0;
        if state.mode != Mode::Dive || state.settings.dive_mode != DiveMode::Ccr {
            return 0;
        }

        if state.settings.auto_setpoint {
            if let Some(id) = self.auto_setpoint_id(state) {
                self.better_setpoint_id = id;
                let cbar = state.settings.setpoint[id as usize].setpoint_cbar;
                if cbar != state.life.actual_gas.setpoint_cbar {
                    let gas_id = state.life.actual_gas.gas_id;
                    set_actual_gas_dm(state, gas_id, cbar);
                }
            }
            return 0;
        }

        let depth = state.life.depth_m;
        let mut best: Option<(u8, u8)> = None;
        for id in 1..SETPOINT_TABLE_LEN {
            let slot = &state.settings.setpoint[id];
            if slot.note.active
                && slot.depth_m as f32 <= depth
                && best.map_or(true, |(_, best_depth)| slot.depth_m > best_depth)
            {
                best = Some((id as u8, slot.depth_m));
            }
        }

        if let Some((id, _)) = best {
            self.better_setpoint_id = id;
            if state.settings.setpoint[id as usize].setpoint_cbar != state.life.actual_gas.setpoint_cbar {
                state.warnings.better_setpoint = 1;
            }
        }
        state.warnings.better_setpoint
    }

    fn auto_setpoint_id(&mut self, state: &DiveState) -> Option<u8> {
        let settings = &state.settings;
        let depth = state.life.depth_m;
        let deco = state.deco_info();
        let low = &settings.setpoint[SETPOINT_ID_AUTO_LOW as usize];
        let high = &settings.setpoint[SETPOINT_ID_AUTO_HIGH as usize];
        let deco_slot = &settings.setpoint[SETPOINT_ID_AUTO_DECO as usize];

        let low_reached = low.note.active && depth <= low.depth_m as f32;
        self.setpoint_low_delayed =
            low_reached && settings.delay_setpoint_low && deco.has_obligation();

        let mut target = None;
        if high.note.active && depth >= high.depth_m as f32 && !self.setpoint_deco_activated {
            target = Some(SETPOINT_ID_AUTO_HIGH);
        }

        if deco_slot.note.active
            && !self.setpoint_deco_activated
            && deco.has_obligation()
            && depth <= deco.next_stop_depth_m() + DECO_SETPOINT_BAND_M
        {
            target = Some(SETPOINT_ID_AUTO_DECO);
        }

        if low_reached && !self.setpoint_low_delayed {
            target = Some(SETPOINT_ID_AUTO_LOW);
        }

        // One-shot, only once the deco switch is actually handed out
        if target == Some(SETPOINT_ID_AUTO_DECO) {
            self.setpoint_deco_activated = true;
        }
        target
    }
}

fn tracks_gas(mode: DiveMode) -> bool {
    !matches!(mode, DiveMode::Gauge | DiveMode::Apnea)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deco::DecoStop;
    use crate::gas::SetpointSlot;

    fn oc_state() -> DiveState {
        let mut state = DiveState::default();
        state.mode = Mode::Dive;
        state.settings.gas[2] = GasSlot::new(50, 0).deco_at(21);
        state.settings.gas[3] = GasSlot::new(100, 0).deco_at(9);
        set_actual_gas(&mut state.life, &state.settings, 1, 0);
        state
    }

    fn with_obligation(state: &mut DiveState, stop_m: f32, zone_start_m: f32) {
        state.deco_buehlmann.stops.clear();
        state.deco_buehlmann.stops.push(DecoStop { depth_m: stop_m, length_s: 120 }).unwrap();
        state.deco_buehlmann.deco_zone_start_m = zone_start_m;
    }

    #[test]
    fn actual_gas_complements_mix() {
        let mut settings = DiveSettings::default();
        settings.gas[4] = GasSlot::new(18, 45);
        let mut life = LifeData::default();

        set_actual_gas(&mut life, &settings, 4, 130);
        assert_eq!(life.actual_gas.nitrogen_percent, 37);
        assert_eq!(life.actual_gas.oxygen_percent(), 18);
        // Open circuit: no setpoint
        assert_eq!(life.actual_gas.setpoint_cbar, 0);
        assert_eq!(life.actual_gas.applied_dive_mode, DiveMode::Oc);
    }

    #[test]
    fn diluent_is_remembered_on_the_loop() {
        let mut settings = DiveSettings::default();
        settings.dive_mode = DiveMode::Ccr;
        let mut life = LifeData { depth_m: 12.0, ..LifeData::default() };

        set_actual_gas(&mut life, &settings, 6, 70);
        assert_eq!(life.last_diluent_id, 6);
        assert_eq!(life.last_diluent_depth_m, 12.0);
        assert_eq!(life.actual_gas.setpoint_cbar, 70);
    }

    #[test]
    fn out_of_range_id_is_clamped() {
        let settings = DiveSettings::default();
        let mut life = LifeData::default();
        set_actual_gas(&mut life, &settings, 200, 0);
        assert_eq!(life.actual_gas.gas_id, MAX_GAS_ID);
    }

    #[test]
    fn deco_gases_on_the_way_up() {
        let mut state = oc_state();
        with_obligation(&mut state, 6.0, 30.0);

        state.life.depth_m = 20.0;
        assert_eq!(get_better_gas_id(false, 1, &state), 2);

        state.life.depth_m = 8.0;
        assert_eq!(get_better_gas_id(false, 1, &state), 3);
    }

    #[test]
    fn no_candidate_keeps_starting_id() {
        let mut state = oc_state();
        with_obligation(&mut state, 6.0, 40.0);
        state.life.depth_m = 35.0;
        assert_eq!(get_better_gas_id(false, 1, &state), 1);
    }

    #[test]
    fn travel_phase_takes_deepest_reached() {
        let mut state = DiveState::default();
        state.settings.gas[1] = GasSlot::new(32, 0).travel_at(0);
        state.settings.gas[2] = GasSlot::new(18, 45).first().travel_at(30);

        state.life.depth_m = 20.0;
        assert_eq!(get_better_gas_id(false, 2, &state), 1);
        state.life.depth_m = 30.0;
        assert_eq!(get_better_gas_id(false, 1, &state), 2);
    }

    #[test]
    fn pscr_first_gas_counts_as_deco_gas_at_mod() {
        let mut state = DiveState::default();
        state.settings.dive_mode = DiveMode::Pscr;
        state.settings.gas[1] = GasSlot::new(21, 0);
        state.settings.gas[2] = GasSlot::new(50, 0).first();
        with_obligation(&mut state, 6.0, 40.0);

        // EAN50 at 1.6 bar: MOD 22 m
        state.life.depth_m = 21.0;
        assert_eq!(get_better_gas_id(false, 1, &state), 2);
        state.life.depth_m = 25.0;
        assert_eq!(get_better_gas_id(false, 1, &state), 1);
    }

    #[test]
    fn better_gas_warns_only_on_other_mix() {
        let mut state = oc_state();
        let mut selector = GasSetpointSelector::new();
        with_obligation(&mut state, 6.0, 30.0);
        state.life.depth_m = 20.0;
        assert_eq!(selector.check_better_gas(&mut state), 1);
        assert_eq!(selector.actual_better_gas_id(), 2);

        // Slot 4 carries the same mix as the breathed gas
        state.settings.gas[2].note.active = false;
        state.settings.gas[4] = GasSlot::new(21, 0).deco_at(21);
        assert_eq!(selector.check_better_gas(&mut state), 0);
        assert_eq!(selector.actual_better_gas_id(), 4);

        state.mode = Mode::Surface;
        assert_eq!(selector.check_better_gas(&mut state), 0);
    }

    #[test]
    fn bailout_writes_bailout_event() {
        let mut state = DiveState::default();
        state.settings.dive_mode = DiveMode::Ccr;
        set_actual_gas(&mut state.life, &state.settings, 6, 70);

        set_actual_gas_dm(&mut state, 1, 0);
        assert_eq!(state.settings.dive_mode, DiveMode::Oc);
        assert_eq!(state.events.bailout, Some(BailoutInfo { oxygen_percent: 21, helium_percent: 0 }));
        assert_eq!(state.events.gas_change, None);
        assert_eq!(state.life.actual_gas.setpoint_cbar, 0);
    }

    #[test]
    fn pscr_gas_switch_is_not_a_bailout() {
        let mut state = DiveState::default();
        state.settings.dive_mode = DiveMode::Pscr;
        state.settings.gas[2] = GasSlot::new(50, 0).deco_at(21);
        set_actual_gas(&mut state.life, &state.settings, 1, 0);

        set_actual_gas_dm(&mut state, 2, 0);
        assert_eq!(state.settings.dive_mode, DiveMode::Pscr);
        assert_eq!(state.events.gas_change, Some(2));
        assert_eq!(state.events.bailout, None);
    }

    #[test]
    fn gas_change_events_are_edge_triggered() {
        let mut state = oc_state();
        set_actual_gas_dm(&mut state, 1, 0);
        assert!(state.events.is_empty());

        set_actual_gas_dm(&mut state, 2, 0);
        assert_eq!(state.events.gas_change, Some(2));
    }

    #[test]
    fn extra_gas_uses_slot_zero() {
        let mut state = oc_state();
        set_actual_gas_extra_gas(&mut state, 40, 0);
        assert_eq!(state.life.actual_gas.gas_id, EXTRA_GAS_ID);
        assert_eq!(state.life.actual_gas.oxygen_percent(), 40);
        assert_eq!(state.events.manual_gas_set, Some(BailoutInfo { oxygen_percent: 40, helium_percent: 0 }));
        assert_eq!(state.events.bailout, None);
    }

    #[test]
    fn manual_setpoint_proposes_deepest_reached() {
        let mut state = DiveState::default();
        state.mode = Mode::Dive;
        state.settings.dive_mode = DiveMode::Ccr;
        state.settings.setpoint[2].note.active = true;
        set_actual_gas(&mut state.life, &state.settings, 6, 70);
        let mut selector = GasSetpointSelector::new();

        state.life.depth_m = 10.0;
        assert_eq!(selector.check_better_setpoint(&mut state), 0);

        state.life.depth_m = 25.0;
        assert_eq!(selector.check_better_setpoint(&mut state), 1);
        assert_eq!(selector.actual_better_setpoint_id(), 2);
        // Manual mode never switches by itself
        assert_eq!(state.life.actual_gas.setpoint_cbar, 70);
    }

    #[test]
    fn auto_setpoint_switches_and_logs() {
        let mut state = DiveState::default();
        state.mode = Mode::Dive;
        state.settings.dive_mode = DiveMode::Ccr;
        state.settings.auto_setpoint = true;
        state.settings.setpoint[1] = SetpointSlot::new(70, 3);
        state.settings.setpoint[2] = SetpointSlot::new(130, 10);
        state.settings.setpoint[3] = SetpointSlot::new(140, 0);
        set_actual_gas(&mut state.life, &state.settings, 6, 70);
        let mut selector = GasSetpointSelector::new();

        state.life.depth_m = 15.0;
        assert_eq!(selector.check_better_setpoint(&mut state), 0);
        assert_eq!(state.life.actual_gas.setpoint_cbar, 130);
        assert_eq!(state.events.setpoint_change, Some(130));

        // Within 3 m of the next stop: deco setpoint, once
        with_obligation(&mut state, 9.0, 20.0);
        state.life.depth_m = 11.5;
        selector.check_better_setpoint(&mut state);
        assert_eq!(state.life.actual_gas.setpoint_cbar, 140);
        assert!(selector.setpoint_deco_activated());

        state.life.depth_m = 12.5;
        selector.check_better_setpoint(&mut state);
        assert_eq!(state.life.actual_gas.setpoint_cbar, 140);
    }

    #[test]
    fn low_setpoint_waits_for_obligation() {
        let mut state = DiveState::default();
        state.mode = Mode::Dive;
        state.settings.dive_mode = DiveMode::Ccr;
        state.settings.auto_setpoint = true;
        state.settings.delay_setpoint_low = true;
        state.settings.setpoint[1] = SetpointSlot::new(70, 3);
        state.settings.setpoint[2] = SetpointSlot::new(130, 10);
        set_actual_gas(&mut state.life, &state.settings, 6, 130);
        let mut selector = GasSetpointSelector::new();

        with_obligation(&mut state, 3.0, 20.0);
        state.life.depth_m = 2.0;
        selector.check_better_setpoint(&mut state);
        assert!(selector.setpoint_low_delayed());
        assert_eq!(state.life.actual_gas.setpoint_cbar, 130);

        state.deco_buehlmann.stops.clear();
        selector.check_better_setpoint(&mut state);
        assert!(!selector.setpoint_low_delayed());
        assert_eq!(state.life.actual_gas.setpoint_cbar, 70);
    }

    #[test]
    fn delayed_low_does_not_swallow_deco_setpoint() {
        let mut state = DiveState::default();
        state.mode = Mode::Dive;
        state.settings.dive_mode = DiveMode::Ccr;
        state.settings.auto_setpoint = true;
        state.settings.delay_setpoint_low = true;
        state.settings.setpoint[1] = SetpointSlot::new(70, 6);
        state.settings.setpoint[2] = SetpointSlot::new(130, 10);
        state.settings.setpoint[3] = SetpointSlot::new(140, 0);
        set_actual_gas(&mut state.life, &state.settings, 6, 70);
        with_obligation(&mut state, 3.0, 20.0);
        let mut selector = GasSetpointSelector::new();

        state.life.depth_m = 12.0;
        selector.check_better_setpoint(&mut state);
        assert_eq!(state.life.actual_gas.setpoint_cbar, 130);

        // Low switch depth lies inside the deco band of the 3 m stop
        state.life.depth_m = 6.0;
        selector.check_better_setpoint(&mut state);
        assert!(selector.setpoint_low_delayed());
        assert!(selector.setpoint_deco_activated());
        assert_eq!(state.life.actual_gas.setpoint_cbar, 140);

        state.life.depth_m = 4.0;
        selector.check_better_setpoint(&mut state);
        assert_eq!(state.life.actual_gas.setpoint_cbar, 140);
        assert_eq!(state.events.setpoint_change, Some(140));
    }
}
