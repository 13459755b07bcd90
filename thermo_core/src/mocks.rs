//! Test and helper mocks for thermo_core.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thermo_traits::Transport;

/// A transport that accepts writes and never produces data; useful for
/// exercising loop pacing against a permanently silent device.
pub struct SilentTransport;

impl Transport for SilentTransport {
    fn send(&mut self, _bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        Ok(0)
    }

    fn read_line(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }
}

/// Shared record of every directive written to a [`ScriptedTransport`],
/// with the line terminator stripped.
#[derive(Debug, Clone, Default)]
pub struct TransportLog(Arc<Mutex<Vec<String>>>);

impl TransportLog {
    pub fn sent(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, line: String) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

/// Shared queue of response lines a [`ScriptedTransport`] will serve.
#[derive(Debug, Clone, Default)]
pub struct ResponseScript(Arc<Mutex<VecDeque<String>>>);

impl ResponseScript {
    pub fn push(&self, line: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(line.into());
    }

    fn byte_len(&self) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|l| l.len() + 1)
            .sum()
    }

    fn pop(&self) -> Option<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Deterministic transport double: records outbound directives, serves a
/// scripted sequence of response lines, and can be told to fail the next
/// N sends to drive the error-budget policy.
pub struct ScriptedTransport {
    log: TransportLog,
    responses: ResponseScript,
    fail_sends: Arc<AtomicUsize>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            log: TransportLog::default(),
            responses: ResponseScript::default(),
            fail_sends: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle for inspecting sent directives after the transport has been
    /// moved into a polling loop.
    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }

    /// Handle for feeding response lines while the loop runs.
    pub fn responses(&self) -> ResponseScript {
        self.responses.clone()
    }

    /// Make the next `n` sends fail with an I/O error.
    pub fn fail_next_sends(&self, n: usize) {
        self.fail_sends.store(n, Ordering::SeqCst);
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let remaining = self.fail_sends.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_sends.store(remaining - 1, Ordering::SeqCst);
            return Err(Box::new(std::io::Error::other("scripted write failure")));
        }
        let text = String::from_utf8_lossy(bytes);
        self.log.push(text.trim_end_matches(['\r', '\n']).to_string());
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.responses.byte_len())
    }

    fn read_line(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.responses.pop())
    }
}
