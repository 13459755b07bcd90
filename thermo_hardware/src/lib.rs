//! Transport backends for the heater link: a real serial port (feature
//! `serial`, default on) and a deterministic simulated heater used by
//! tests, self-check, and `--sim` runs.
pub mod error;
#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "serial")]
pub use serial::{SerialTransport, list_ports, open_serial};

use std::collections::VecDeque;
use std::time::Duration;

use thermo_traits::Transport;

const AMBIENT_C: f32 = 21.0;

/// In-memory heater controller speaking the device's line protocol.
///
/// The thermal model is deterministic: each temperature query advances a
/// first-order approach toward the setpoint while the output is enabled,
/// or back toward ambient while it is disabled. No RNG, so tests can
/// assert exact trajectories.
pub struct SimulatedHeater {
    setpoint: f32,
    temperature: f32,
    output_on: bool,
    pid: (f32, f32, f32),
    outbox: VecDeque<u8>,
}

impl Default for SimulatedHeater {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHeater {
    pub fn new() -> Self {
        Self {
            setpoint: 20.0,
            temperature: AMBIENT_C,
            output_on: true,
            pid: (6.0, 7.0, 4.0),
            outbox: VecDeque::new(),
        }
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn output_on(&self) -> bool {
        self.output_on
    }

    pub fn pid(&self) -> (f32, f32, f32) {
        self.pid
    }

    fn queue_response(&mut self, line: String) {
        self.outbox.extend(line.as_bytes());
        self.outbox.push_back(b'\n');
    }

    fn step_model(&mut self) {
        let target = if self.output_on {
            self.setpoint
        } else {
            AMBIENT_C
        };
        self.temperature += 0.2 * (target - self.temperature);
    }

    fn current_draw(&self) -> f32 {
        if self.output_on {
            (0.25 * (self.setpoint - self.temperature).abs()).clamp(0.0, 2.5)
        } else {
            0.0
        }
    }

    fn handle(&mut self, directive: &str) {
        if directive == "*GETTPRS;" {
            let v = self.setpoint;
            self.queue_response(format!("*TPRS {v:07.3}"));
        } else if directive == "*GETTACT;" {
            self.step_model();
            let v = self.temperature;
            self.queue_response(format!("*TACT {v:07.3}"));
        } else if directive == "*GETIOUT;" {
            let i = self.current_draw();
            self.queue_response(format!("*IOUT    {i:5.3}A"));
        } else if let Some(v) = directive
            .strip_prefix("*SETTPRS")
            .and_then(|rest| rest.strip_suffix(';'))
        {
            if let Ok(v) = v.trim().parse::<f32>() {
                self.setpoint = v;
            }
        } else if let Some(rest) = directive
            .strip_prefix("*SETCK")
            .and_then(|rest| rest.strip_suffix(';'))
        {
            let mut it = rest.split_whitespace().filter_map(|t| t.parse::<f32>().ok());
            if let (Some(p), Some(i), Some(d)) = (it.next(), it.next(), it.next()) {
                self.pid = (p, i, d);
            }
        } else if directive == "A" {
            self.output_on = true;
        } else if directive == "a" {
            self.output_on = false;
        }
        // Anything else: the device ignores unknown directives.
    }
}

impl Transport for SimulatedHeater {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let text = String::from_utf8_lossy(bytes);
        self.handle(text.trim_end_matches(['\r', '\n']));
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.outbox.len())
    }

    fn read_line(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        let Some(pos) = self.outbox.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        let line: Vec<u8> = self.outbox.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line);
        Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()))
    }
}
