// Integration tests for the scripting host

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chime_scripting_host::{ScriptRunner, TimerService};

#[test]
fn runner_starts_empty() {
    let runner = ScriptRunner::new_with_wasm();

    if !runner.has_wasm_engine() {
        println!("WARNING: WASM engine not initialized!");
    }

    assert_eq!(runner.script_count(), 0, "Should start with no scripts");
    assert!(runner.script_ids().is_empty());
    assert_eq!(runner.active_timer_count(), 0);
}

#[test]
fn loading_from_a_missing_directory_is_harmless() {
    let mut runner = ScriptRunner::new_with_wasm();

    let missing = std::path::Path::new("/nonexistent/chime-scripts");
    runner.load_scripts(missing, &HashMap::new());

    assert_eq!(runner.script_count(), 0);
}

#[test]
fn loading_skips_files_that_are_not_components() {
    let mut runner = ScriptRunner::new_with_wasm();
    if !runner.has_wasm_engine() {
        println!("Warning: no WASM engine, skipping");
        return;
    }

    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("notes.txt"), "not a script").unwrap();
    std::fs::write(dir.path().join("broken.wasm"), b"\x00asm garbage").unwrap();

    runner.load_scripts(dir.path(), &HashMap::new());

    assert_eq!(runner.script_count(), 0);
}

#[test]
fn pump_drives_timers_without_scripts() {
    let mut runner = ScriptRunner::new_with_tick_rate(Duration::from_millis(10));
    let start = Instant::now();

    // No scripts, no timers: pumping repeatedly must be a no-op
    for i in 1..=5u64 {
        runner.pump(start + Duration::from_millis(20 * i));
    }
    assert_eq!(runner.active_timer_count(), 0);
}

#[test]
fn timer_service_round_trip_over_simulated_frames() {
    let mut service = TimerService::new();

    let beat = service.repeat_for_script(0, 3, 0.1);
    let farewell = service.delay_for_script(0, 0.25);
    assert_ne!(beat, 0);
    assert_ne!(farewell, 0);
    assert_eq!(service.active_count(), 2);

    let mut beats = 0;
    let mut farewells = 0;
    for _ in 0..10 {
        service.advance(Duration::from_millis(50));
        while let Some(fired) = service.next_fired() {
            assert_eq!(fired.script, 0);
            if fired.handle.raw() == beat {
                beats += 1;
            } else if fired.handle.raw() == farewell {
                farewells += 1;
            } else {
                panic!("unexpected handle {}", fired.handle.raw());
            }
        }
    }

    assert_eq!(beats, 3);
    assert_eq!(farewells, 1);
    assert_eq!(service.active_count(), 0);
}

#[test]
fn killing_mid_flight_stops_delivery() {
    let mut service = TimerService::new();

    let beat = service.repeat_for_script(0, 100, 0.1);
    assert_ne!(beat, 0);

    service.advance(Duration::from_millis(100));
    assert!(service.next_fired().is_some());

    // Simulates a script cancelling from inside a timer dispatch
    service.kill_for_script(beat);
    assert_eq!(service.active_count(), 0);

    for _ in 0..10 {
        service.advance(Duration::from_millis(100));
        assert!(service.next_fired().is_none());
    }
}
