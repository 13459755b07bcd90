//! Connection lifecycle state, shared between the link facade and the
//! background loops.

use std::sync::{Arc, Mutex, PoisonError};

/// Observable connection lifecycle.
///
/// `Connected -> Disconnected` happens only via an explicit disconnect;
/// the polling loop reports budget exhaustion as `Failed` and never
/// transitions the state back on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

/// Clonable handle to the single connection state cell.
#[derive(Debug, Clone)]
pub struct SharedState(Arc<Mutex<ConnectionState>>);

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(ConnectionState::Disconnected)))
    }

    pub fn get(&self) -> ConnectionState {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, next: ConnectionState) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.get(), ConnectionState::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_shares_writes() {
        let a = SharedState::new();
        let b = a.clone();
        assert_eq!(a.get(), ConnectionState::Disconnected);
        b.set(ConnectionState::Connected);
        assert!(a.is_connected());
        b.set(ConnectionState::Failed("budget".into()));
        assert!(!a.is_connected());
    }
}
