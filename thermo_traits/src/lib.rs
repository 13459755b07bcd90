pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Byte transport carrying the device's line protocol.
///
/// Implementations own the underlying handle (serial port, simulator);
/// the polling loop is the only caller once a connection is live.
pub trait Transport {
    /// Write an encoded directive and flush it to the device.
    fn send(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Number of unread bytes currently buffered on the transport.
    fn bytes_available(&mut self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>>;

    /// Read one line, waiting at most `timeout` for the terminator.
    ///
    /// Returns `Ok(None)` when the timeout elapses without a complete
    /// line; the partial input stays buffered for the next call.
    fn read_line(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
}
