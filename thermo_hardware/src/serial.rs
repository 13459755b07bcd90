//! `serialport`-backed transport.
//!
//! The port is opened 8N1 with a bounded read timeout; a read can block
//! at most that long, which keeps every polling-loop iteration bounded
//! even against a silent device.
use crate::error::HwError;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Read;
use std::io::Write;
use std::time::{Duration, Instant};
use thermo_traits::Transport;

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    /// Bytes received after the last complete line.
    pending: Vec<u8>,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

/// Open the named serial port for the heater link.
///
/// On non-Windows targets a missing device node fails fast with
/// `PortNotFound` instead of surfacing a generic open error.
pub fn open_serial(path: &str, baud: u32, read_timeout: Duration) -> Result<SerialTransport, HwError> {
    if !cfg!(windows) && !std::path::Path::new(path).exists() {
        return Err(HwError::PortNotFound(path.to_string()));
    }

    let port = serialport::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(read_timeout)
        .open()
        .map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => HwError::PortNotFound(path.to_string()),
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                HwError::Busy(format!("{path}: {e}"))
            }
            _ => HwError::Io(format!("open {path}: {e}")),
        })?;

    tracing::info!(path, baud, "serial port open");
    Ok(SerialTransport {
        port,
        pending: Vec::new(),
    })
}

/// Enumerate serial device nodes visible to the process.
pub fn list_ports() -> Result<Vec<String>, HwError> {
    let ports = serialport::available_ports().map_err(|e| HwError::Io(e.to_string()))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Box an I/O failure as the transport's trait-object error, keeping the
/// typed `HwError` downcastable on the far side of the boundary.
fn io_err(e: impl std::fmt::Display) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(HwError::Io(e.to_string()))
}

/// Split the first newline-terminated line out of `pending`, if any.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=pos).collect();
    let text = String::from_utf8_lossy(&line);
    Some(text.trim_end_matches(['\r', '\n']).to_string())
}

impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.port.write_all(bytes).map_err(io_err)?;
        self.port.flush().map_err(io_err)?;
        tracing::trace!(n = bytes.len(), "serial write");
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let queued = self.port.bytes_to_read().map_err(io_err)? as usize;
        Ok(self.pending.len() + queued)
    }

    fn read_line(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(line) = take_line(&mut self.pending) {
            return Ok(Some(line));
        }

        self.port.set_timeout(timeout).map_err(io_err)?;
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 256];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    if let Some(line) = take_line(&mut self.pending) {
                        return Ok(Some(line));
                    }
                }
                // A timed-out read is not an error: the partial input
                // stays in `pending` for the next cycle.
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(None),
                Err(e) => return Err(io_err(e)),
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }
}
