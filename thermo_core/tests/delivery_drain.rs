//! Drain semantics and shutdown behavior of the delivery scheduler.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thermo_core::delivery::Delivery;
use thermo_core::{ConnectionState, Sample, SampleKind, SharedState};
use thermo_traits::clock::MonotonicClock;

fn sample(n: usize) -> Sample {
    Sample {
        kind: SampleKind::Temperature,
        value: n as f32,
        timestamp_s: n as f64 / 10.0,
    }
}

fn connected_state() -> SharedState {
    let state = SharedState::new();
    state.set(ConnectionState::Connected);
    state
}

#[test]
fn batch_holds_everything_since_previous_tick_then_empties() {
    let (tx, rx) = crossbeam_channel::unbounded();
    for n in 0..5 {
        tx.send(sample(n)).unwrap();
    }

    let batches: Arc<Mutex<Vec<Vec<Sample>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = batches.clone();
    let delivery = Delivery::spawn(
        rx,
        Duration::from_millis(10),
        connected_state(),
        Box::new(move |batch| sink.lock().unwrap().push(batch)),
        MonotonicClock::new(),
    );

    let start = Instant::now();
    while batches.lock().unwrap().len() < 4 && start.elapsed() < Duration::from_secs(2) {
        std::thread::sleep(Duration::from_millis(5));
    }
    delivery.stop();

    let batches = batches.lock().unwrap();
    // The five queued samples arrive in one batch, exactly once.
    assert_eq!(batches[0].len(), 5);
    let values: Vec<f32> = batches[0].iter().map(|s| s.value).collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    // With no new arrivals the following ticks deliver empty batches.
    assert!(batches[1..].iter().all(|b| b.is_empty()));
}

#[test]
fn no_callback_runs_after_stop_returns() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let calls = Arc::new(Mutex::new(0usize));
    let sink = calls.clone();
    let delivery = Delivery::spawn(
        rx,
        Duration::from_millis(5),
        connected_state(),
        Box::new(move |_| *sink.lock().unwrap() += 1),
        MonotonicClock::new(),
    );

    std::thread::sleep(Duration::from_millis(40));
    delivery.stop();
    let frozen = *calls.lock().unwrap();
    assert!(frozen > 0);

    // Feed more samples; nothing may be delivered anymore.
    for n in 0..3 {
        tx.send(sample(n)).unwrap();
    }
    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(*calls.lock().unwrap(), frozen);
}

#[test]
fn delivery_halts_when_connection_leaves_connected() {
    let (_tx, rx) = crossbeam_channel::unbounded::<Sample>();
    let state = connected_state();
    let calls = Arc::new(Mutex::new(0usize));
    let sink = calls.clone();
    let delivery = Delivery::spawn(
        rx,
        Duration::from_millis(5),
        state.clone(),
        Box::new(move |_| *sink.lock().unwrap() += 1),
        MonotonicClock::new(),
    );

    std::thread::sleep(Duration::from_millis(30));
    state.set(ConnectionState::Failed("budget".into()));
    std::thread::sleep(Duration::from_millis(30));
    let after_fail = *calls.lock().unwrap();
    std::thread::sleep(Duration::from_millis(30));
    // At most one in-flight tick after the state flip, then silence.
    assert!(*calls.lock().unwrap() <= after_fail + 1);
    delivery.stop();
}
