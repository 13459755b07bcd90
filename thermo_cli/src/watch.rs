//! Link assembly and the watch/set/self-check command bodies.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use serde_json::json;
use thermo_core::util::write_atomic;
use thermo_core::{ConnectionState, DeviceLink, LinkCfg, Sample, SampleKind, Snapshot};
use thermo_hardware::SimulatedHeater;

use crate::cli::{JSON_MODE, OutputMode};

fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

/// Build a link from config and connect it to the chosen backend.
pub fn open_link(cfg: &thermo_config::Config, sim: bool) -> eyre::Result<DeviceLink> {
    let mut link = DeviceLink::new(LinkCfg::from(cfg))?;
    if sim {
        link.connect(SimulatedHeater::new())?;
        return Ok(link);
    }

    #[cfg(feature = "serial")]
    {
        let transport = thermo_hardware::open_serial(
            &cfg.serial.port,
            cfg.serial.baud,
            Duration::from_millis(cfg.serial.read_timeout_ms),
        )
        .map_err(|e| thermo_core::hw_error::map_transport_error(&e))
        .map_err(eyre::Report::new)?;
        link.connect(transport)?;
        Ok(link)
    }
    #[cfg(not(feature = "serial"))]
    {
        eyre::bail!("built without serial support; rerun with --sim or enable the `serial` feature")
    }
}

/// Send the startup directives a session may carry.
fn send_startup_commands(
    link: &DeviceLink,
    cfg: &thermo_config::Config,
    setpoint: Option<f32>,
    send_pid: bool,
    output: Option<OutputMode>,
) -> eyre::Result<()> {
    if let Some(v) = setpoint {
        let clamped = cfg.clamp_setpoint(v);
        if clamped != v {
            tracing::warn!(requested = v, clamped, "setpoint outside configured range");
        }
        link.set_setpoint(clamped)?;
    }
    if send_pid {
        link.set_pid(cfg.pid.p, cfg.pid.i, cfg.pid.d)?;
    }
    if let Some(mode) = output {
        link.set_output(mode == OutputMode::On)?;
    }
    Ok(())
}

fn print_sample(sample: &Sample) {
    let kind = match sample.kind {
        SampleKind::Temperature => "temperature",
        SampleKind::Current => "current",
        SampleKind::SetpointEcho => "setpoint",
    };
    if json_mode() {
        println!(
            "{}",
            json!({ "kind": kind, "value": sample.value, "t_s": sample.timestamp_s })
        );
    } else {
        println!("{:>10.2}s  {kind:>11}  {:8.3}", sample.timestamp_s, sample.value);
    }
}

/// `watch`: stream telemetry until Ctrl-C, duration expiry, or failure.
pub fn run_watch(
    cfg: &thermo_config::Config,
    sim: bool,
    duration_s: Option<u64>,
    setpoint: Option<f32>,
    send_pid: bool,
    save: Option<&std::path::Path>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let mut link = open_link(cfg, sim)?;
    send_startup_commands(&link, cfg, setpoint, send_pid, None)?;
    link.start_delivery(Box::new(|batch| {
        for sample in &batch {
            print_sample(sample);
        }
    }))?;

    let started = Instant::now();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("interrupted, closing session");
            break;
        }
        if let Some(limit) = duration_s
            && started.elapsed() >= Duration::from_secs(limit)
        {
            break;
        }
        match link.state() {
            ConnectionState::Connected => {}
            ConnectionState::Failed(reason) => {
                link.disconnect();
                if let Some(path) = save {
                    save_session(&link.snapshot(), path)?;
                }
                eyre::bail!("connection failed: {reason}");
            }
            other => {
                link.disconnect();
                eyre::bail!("connection lost unexpectedly: {other:?}");
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    link.disconnect();
    let snap = link.snapshot();
    if let Some(path) = save {
        save_session(&snap, path)?;
        tracing::info!(?path, "session snapshot written");
    }
    print_summary(&snap);
    Ok(())
}

fn print_summary(snap: &Snapshot) {
    let duration_s = match (snap.time_s.first(), snap.time_s.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };
    if json_mode() {
        println!(
            "{}",
            json!({
                "status": "ok",
                "samples": snap.time_s.len(),
                "duration_s": duration_s,
                "last_temperature": snap.last_temperature,
                "last_current": snap.last_current,
                "setpoint": snap.setpoint,
            })
        );
    } else {
        println!(
            "session complete: {} samples over {duration_s:.1}s (last {:.2} C, {:.3} A, setpoint {:.2} C)",
            snap.time_s.len(),
            snap.last_temperature,
            snap.last_current,
            snap.setpoint,
        );
    }
}

/// Persist the snapshot in the session-record shape consumers expect:
/// metadata plus the three ordered sequences.
fn save_session(snap: &Snapshot, path: &std::path::Path) -> eyre::Result<()> {
    let duration_s = match (snap.time_s.first(), snap.time_s.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };
    let saved_unix_s = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let record = json!({
        "metadata": {
            "saved_unix_s": saved_unix_s,
            "duration_s": duration_s,
            "samples": snap.time_s.len(),
            "setpoint": snap.setpoint,
        },
        "temperature": snap.temperature,
        "current": snap.current,
        "time": snap.time_s,
    });
    let bytes = serde_json::to_vec_pretty(&record)?;
    write_atomic(path, &bytes).wrap_err_with(|| format!("write session snapshot {path:?}"))?;
    Ok(())
}

/// `set`: connect, issue the requested directives, linger long enough for
/// the polling loop to drain them, and exit.
pub fn run_set(
    cfg: &thermo_config::Config,
    sim: bool,
    setpoint: Option<f32>,
    output: Option<OutputMode>,
    pid: bool,
) -> eyre::Result<()> {
    if setpoint.is_none() && output.is_none() && !pid {
        eyre::bail!("nothing to send: pass --setpoint, --output, and/or --pid");
    }
    let mut link = open_link(cfg, sim)?;
    send_startup_commands(&link, cfg, setpoint, pid, output)?;

    // Commands drain one per poll cycle; three cycles covers the worst mix.
    std::thread::sleep(Duration::from_millis(cfg.poll.interval_ms.saturating_mul(4).max(50)));
    if let ConnectionState::Failed(reason) = link.state() {
        eyre::bail!("connection failed: {reason}");
    }
    link.disconnect();

    if json_mode() {
        println!("{}", json!({ "status": "ok" }));
    } else {
        println!("ok");
    }
    Ok(())
}

/// `self-check`: run the whole stack against the simulated heater and
/// require telemetry of both kinds within a short deadline.
pub fn run_self_check() -> eyre::Result<()> {
    let mut cfg = LinkCfg::default();
    cfg.poll.interval_ms = 10;
    cfg.delivery.interval_ms = 20;

    let mut link = DeviceLink::new(cfg)?;
    link.connect(SimulatedHeater::new())?;

    let started = Instant::now();
    let deadline = Duration::from_secs(3);
    loop {
        let snap = link.snapshot();
        if !snap.temperature.is_empty() && !snap.current.is_empty() {
            link.disconnect();
            let elapsed_ms = started.elapsed().as_millis();
            if json_mode() {
                println!(
                    "{}",
                    json!({ "status": "ok", "elapsed_ms": elapsed_ms as u64 })
                );
            } else {
                println!("self-check ok ({elapsed_ms} ms)");
            }
            return Ok(());
        }
        if started.elapsed() > deadline {
            link.disconnect();
            eyre::bail!("self-check failed: no telemetry from the simulated heater");
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// `ports`: enumerate serial device nodes.
pub fn run_ports() -> eyre::Result<()> {
    #[cfg(feature = "serial")]
    {
        let ports = thermo_hardware::list_ports()
            .map_err(|e| thermo_core::hw_error::map_transport_error(&e))
            .map_err(eyre::Report::new)?;
        if json_mode() {
            println!("{}", json!({ "ports": ports }));
        } else if ports.is_empty() {
            println!("no serial ports found");
        } else {
            for p in ports {
                println!("{p}");
            }
        }
        Ok(())
    }
    #[cfg(not(feature = "serial"))]
    {
        eyre::bail!("built without serial support; port enumeration unavailable")
    }
}
