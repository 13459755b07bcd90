#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the heater link.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section carries serde defaults so a partial file (or an empty
//!   one) yields a runnable configuration for the simulated backend.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SerialCfg {
    /// Serial device node (e.g. /dev/ttyUSB0, COM4)
    pub port: String,
    pub baud: u32,
    /// Bounded per-read timeout so the polling loop never hangs on a silent device
    pub read_timeout_ms: u64,
}

impl Default for SerialCfg {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud: 9600,
            read_timeout_ms: 500,
        }
    }
}

/// Platform default device node, used when the TOML omits [serial].port.
fn default_port() -> &'static str {
    if cfg!(windows) {
        "COM4"
    } else if cfg!(target_os = "macos") {
        "/dev/cu.usbserial"
    } else {
        "/dev/ttyUSB0"
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollCfg {
    /// Pause between poll cycles (ms)
    pub interval_ms: u64,
    /// Consecutive transport errors tolerated before the loop stops
    pub error_budget: u32,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            error_budget: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeliveryCfg {
    /// Consumer callback cadence (ms)
    pub interval_ms: u64,
}

impl Default for DeliveryCfg {
    fn default() -> Self {
        Self { interval_ms: 150 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BufferCfg {
    /// Shared ring-buffer capacity for temperature/current/time history
    pub capacity: usize,
}

impl Default for BufferCfg {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

/// Allowed setpoint range; operator requests are clamped into it.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SetpointCfg {
    pub min_c: f32,
    pub max_c: f32,
}

impl Default for SetpointCfg {
    fn default() -> Self {
        Self {
            min_c: -10.0,
            max_c: 50.0,
        }
    }
}

/// PID coefficients forwarded to the device; the host does no control math.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PidCfg {
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

impl Default for PidCfg {
    fn default() -> Self {
        Self {
            p: 6.0,
            i: 7.0,
            d: 4.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputCfg {
    /// Whether the heater output is commanded on at startup
    pub enabled: bool,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub serial: SerialCfg,
    pub poll: PollCfg,
    pub delivery: DeliveryCfg,
    pub buffer: BufferCfg,
    pub setpoint: SetpointCfg,
    pub pid: PidCfg,
    pub output: OutputCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.port.is_empty() {
            eyre::bail!("serial.port must not be empty");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.read_timeout_ms == 0 {
            eyre::bail!("serial.read_timeout_ms must be >= 1");
        }
        if self.serial.read_timeout_ms > 60_000 {
            eyre::bail!("serial.read_timeout_ms is unreasonably large (>60s)");
        }

        // Poll
        if self.poll.interval_ms == 0 {
            eyre::bail!("poll.interval_ms must be >= 1");
        }
        if self.poll.interval_ms > 10_000 {
            eyre::bail!("poll.interval_ms is unreasonably large (>10s)");
        }
        if self.poll.error_budget == 0 {
            eyre::bail!("poll.error_budget must be >= 1");
        }

        // Delivery
        if self.delivery.interval_ms == 0 {
            eyre::bail!("delivery.interval_ms must be >= 1");
        }

        // Buffer
        if self.buffer.capacity == 0 {
            eyre::bail!("buffer.capacity must be >= 1");
        }

        // Setpoint range
        if !self.setpoint.min_c.is_finite() || !self.setpoint.max_c.is_finite() {
            eyre::bail!("setpoint range must be finite");
        }
        if self.setpoint.min_c >= self.setpoint.max_c {
            eyre::bail!("setpoint.min_c must be < setpoint.max_c");
        }

        // PID (the device UI exposes 0..=20 per coefficient)
        for (name, v) in [("p", self.pid.p), ("i", self.pid.i), ("d", self.pid.d)] {
            if !(0.0..=20.0).contains(&v) {
                eyre::bail!("pid.{name} must be in [0.0, 20.0]");
            }
        }

        // Logging
        if let Some(rot) = &self.logging.rotation
            && !matches!(rot.as_str(), "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }

    /// Clamp a requested setpoint into the configured range.
    pub fn clamp_setpoint(&self, value: f32) -> f32 {
        value.clamp(self.setpoint.min_c, self.setpoint.max_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = load_toml("").expect("parse");
        assert_eq!(cfg.serial.baud, 9600);
        assert_eq!(cfg.poll.interval_ms, 100);
        assert_eq!(cfg.poll.error_budget, 10);
        assert_eq!(cfg.delivery.interval_ms, 150);
        assert_eq!(cfg.buffer.capacity, 10_000);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn clamp_setpoint_respects_range() {
        let cfg = Config::default();
        assert_eq!(cfg.clamp_setpoint(100.0), 50.0);
        assert_eq!(cfg.clamp_setpoint(-100.0), -10.0);
        assert_eq!(cfg.clamp_setpoint(21.5), 21.5);
    }
}
