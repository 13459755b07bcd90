//! Connection lifecycle and an end-to-end session against the simulated
//! heater: connect, poll, command, deliver, snapshot, disconnect.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thermo_core::{
    Command, ConnectionState, DeliveryCfg, DeviceLink, LinkCfg, PollCfg, Sample,
};
use thermo_hardware::SimulatedHeater;

fn fast_cfg() -> LinkCfg {
    LinkCfg {
        poll: PollCfg {
            interval_ms: 1,
            error_budget: 10,
            read_timeout_ms: 20,
        },
        delivery: DeliveryCfg { interval_ms: 5 },
        capacity: 256,
    }
}

fn wait_until(deadline: Duration, mut ok: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if ok() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    ok()
}

#[test]
fn full_session_against_simulated_heater() {
    let mut link = DeviceLink::new(fast_cfg()).expect("valid config");
    assert_eq!(link.state(), ConnectionState::Disconnected);

    link.connect(SimulatedHeater::new()).expect("connect");
    assert_eq!(link.state(), ConnectionState::Connected);

    let batches: Arc<Mutex<Vec<Sample>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = batches.clone();
    link.start_delivery(Box::new(move |batch| {
        sink.lock().unwrap().extend(batch);
    }))
    .expect("delivery");

    // Telemetry flows without any operator action.
    assert!(wait_until(Duration::from_secs(3), || {
        let snap = link.snapshot();
        !snap.temperature.is_empty() && !snap.current.is_empty()
    }));

    // Operator changes the setpoint; the device echo lands in the store.
    link.set_setpoint(25.0).expect("request");
    assert!(wait_until(Duration::from_secs(3), || {
        link.snapshot().setpoint == 25.0
    }));

    // Delivery saw the same stream the store did.
    assert!(wait_until(Duration::from_secs(3), || {
        !batches.lock().unwrap().is_empty()
    }));

    let snap = link.snapshot();
    assert_eq!(snap.temperature.len(), snap.time_s.len());
    assert!(snap.current.len() <= snap.temperature.len());

    link.disconnect();
    assert_eq!(link.state(), ConnectionState::Disconnected);
    assert!(!link.polling());
}

#[test]
fn lifecycle_misuse_is_rejected() {
    let mut link = DeviceLink::new(fast_cfg()).unwrap();

    // Request before connect is refused, not silently dropped.
    let err = link.request(Command::OutputOn).unwrap_err();
    assert!(format!("{err}").contains("not connected"));

    link.connect(SimulatedHeater::new()).unwrap();
    let err = link.connect(SimulatedHeater::new()).unwrap_err();
    assert!(format!("{err}").contains("already connected"));

    // Disconnect is idempotent, including when never needed.
    link.disconnect();
    link.disconnect();
    assert_eq!(link.state(), ConnectionState::Disconnected);
}

#[test]
fn reconnect_reuses_store_and_queue() {
    let mut link = DeviceLink::new(fast_cfg()).unwrap();
    link.connect(SimulatedHeater::new()).unwrap();
    assert!(wait_until(Duration::from_secs(3), || {
        !link.snapshot().temperature.is_empty()
    }));
    link.disconnect();
    let before = link.snapshot().temperature.len();
    assert!(before > 0);

    // Second connection appends to the same history.
    link.connect(SimulatedHeater::new()).unwrap();
    assert!(wait_until(Duration::from_secs(3), || {
        link.snapshot().temperature.len() > before
    }));
    link.disconnect();
}

#[test]
fn commands_handle_reports_closed_queue_after_drop() {
    let mut link = DeviceLink::new(fast_cfg()).unwrap();
    link.connect(SimulatedHeater::new()).unwrap();
    let commands = link.commands();
    commands.send(Command::OutputOn).expect("open queue");
    drop(link);
    let err = commands.send(Command::OutputOff).unwrap_err();
    assert!(matches!(err, thermo_core::LinkError::QueueClosed));
}

#[test]
fn zero_capacity_config_is_rejected_at_build() {
    let mut cfg = fast_cfg();
    cfg.capacity = 0;
    let err = DeviceLink::new(cfg).unwrap_err();
    assert!(format!("{err}").contains("capacity"));
}
