use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LinkError {
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),
    #[error("transport io error: {0}")]
    Io(String),
    #[error("timeout waiting for device")]
    Timeout,
    #[error("not connected")]
    NotConnected,
    #[error("command queue closed")]
    QueueClosed,
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
