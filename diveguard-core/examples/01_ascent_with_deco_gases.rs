//! Ascent With Deco Gases Example
//!
//! Runs an open circuit dive with two deco gases through the dive state
//! store and prints what a dive computer UI would show on the way up.
//!
//! ## What You'll Learn
//!
//! - Starting a dive from persisted settings
//! - Feeding telemetry and running the per-tick warning pass
//! - Publishing a decompression plan through the deco lock
//! - Reading the better gas advisory and switching gas
//!
//! ## Control Loop
//!
//! ```text
//! telemetry → ingest_telemetry → tick → advisories / buzzer
//!                                  ↑
//!            begin_deco_recompute → publish_deco_result
//! ```
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_ascent_with_deco_gases
//! ```

use diveguard_core::{
    deco::{DecoStop, NoDecoModel},
    gas::GasSlot,
    selector::set_actual_gas_dm,
    DiveStateStore, Mode, Settings, Telemetry,
};

fn main() {
    println!("DiveGuard Ascent Example");
    println!("========================\n");

    let mut settings = Settings::default();
    settings.gas[2] = GasSlot::new(50, 0).deco_at(21);
    settings.gas[3] = GasSlot::new(100, 0).deco_at(6);

    let model = NoDecoModel;
    let mut store = DiveStateStore::new();
    store.create_dive_settings(&settings, &model);

    println!("Deco gas changes:");
    for change in store.real().settings.deco_gas_changes.iter() {
        println!("  gas {} at {} m", change.gas_id, change.depth_m);
    }
    println!();

    let mut now_ms: u32 = 0;
    let mut dive_time_s: u32 = 0;

    // Descent and bottom phase at 45 m
    for depth in (0..=45).step_by(3).chain(core::iter::repeat(45).take(20)) {
        dive_time_s += 60;
        now_ms += 1000;
        store.ingest_telemetry(&sample(depth as f32, dive_time_s, 0.0), &model, 0);
        store.tick(&model, now_ms, false);
    }

    // The decompression library would run here on its own schedule
    match store.begin_deco_recompute() {
        Ok(scratch) => {
            let plan = &mut scratch.deco_buehlmann;
            plan.ndl_s = 0;
            plan.deco_zone_start_m = 27.0;
            for (depth_m, length_s) in [(3.0, 600), (6.0, 300), (9.0, 180), (12.0, 60)] {
                let _ = plan.stops.push(DecoStop { depth_m, length_s });
            }
        }
        Err(nb::Error::WouldBlock) => println!("Deco recompute still running"),
        Err(nb::Error::Other(e)) => println!("Deco recompute failed: {}", e),
    }
    if let Err(e) = store.publish_deco_result(now_ms) {
        println!("Publish rejected: {}", e);
    }

    println!("Ascent:");
    println!("{:>7} {:>5} {:>6} {:>7} {:>9}", "depth", "gas", "ppO2", "better", "warnings");
    for depth in (6..45).rev().step_by(3) {
        dive_time_s += 60;
        now_ms += 1000;
        store.ingest_telemetry(&sample(depth as f32, dive_time_s, 9.0), &model, 0);
        let report = store.tick(&model, now_ms, false);

        let real = store.real();
        println!(
            "{:>5} m {:>5} {:>6.2} {:>7} {:>9}",
            depth,
            real.life.actual_gas.gas_id,
            real.life.ppo2_bar,
            store.actual_better_gas_id(),
            report.num_warnings,
        );

        if real.warnings.better_gas != 0 {
            let better = store.actual_better_gas_id();
            println!("        -> switching to gas {}", better);
            set_actual_gas_dm(store.state_mut(), better, 0);
        }
    }

    println!("\nLogged events:");
    for event in store.real().events.pending() {
        println!("  {:?}", event);
    }
}

fn sample(depth_m: f32, dive_time_s: u32, ascent_rate_m_min: f32) -> Telemetry {
    Telemetry {
        mode: Mode::Dive,
        depth_m,
        pressure_ambient_bar: 1.0 + depth_m / 10.0,
        pressure_surface_bar: 1.0,
        dive_time_s,
        ascent_rate_m_min,
        battery_charge_percent: 90.0,
        battery_voltage: 4.0,
        ..Telemetry::default()
    }
}
