use thiserror::Error;

/// Typed transport-boundary errors.
///
/// `PortNotFound` and `Busy` are connect-time failures; `Io` and
/// `Timeout` occur on a live connection and are absorbed by the polling
/// loop's error budget.
#[derive(Debug, Error, Clone)]
pub enum HwError {
    #[error("serial port not found: {0}")]
    PortNotFound(String),
    #[error("serial port busy or access denied: {0}")]
    Busy(String),
    #[error("serial io error: {0}")]
    Io(String),
    #[error("timeout waiting for device")]
    Timeout,
}
