//! Maps `Box<dyn Error>` from the `Transport` boundary to typed `LinkError`.
//!
//! `thermo_traits::Transport` uses `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `thermo_hardware::HwError` downcasting.

use crate::error::LinkError;

/// Map a trait-boundary error to a typed `LinkError`.
///
/// Attempts to downcast known transport error types first, then falls back
/// to string-based heuristics.
pub fn map_transport_error(e: &(dyn std::error::Error + 'static)) -> LinkError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "transport-errors")]
    {
        if let Some(hw) = e.downcast_ref::<thermo_hardware::error::HwError>() {
            return match hw {
                thermo_hardware::error::HwError::PortNotFound(p) => {
                    LinkError::TransportUnavailable(format!("port not found: {p}"))
                }
                thermo_hardware::error::HwError::Busy(p) => {
                    LinkError::TransportUnavailable(format!("port busy: {p}"))
                }
                thermo_hardware::error::HwError::Timeout => LinkError::Timeout,
                thermo_hardware::error::HwError::Io(s) => LinkError::Io(s.clone()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        LinkError::Timeout
    } else {
        LinkError::Io(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_fallback_detects_timeouts() {
        let e = std::io::Error::other("Timeout waiting for response");
        assert!(matches!(
            map_transport_error(&e),
            LinkError::Timeout
        ));
    }

    #[cfg(feature = "transport-errors")]
    #[test]
    fn downcasts_typed_hw_errors() {
        let e = thermo_hardware::error::HwError::PortNotFound("/dev/ttyUSB9".into());
        let mapped = map_transport_error(&e);
        assert!(matches!(mapped, LinkError::TransportUnavailable(_)));
        assert!(format!("{mapped}").contains("/dev/ttyUSB9"));
    }
}
