//! Human-readable error descriptions and structured JSON error formatting.

use thermo_core::{BuildError, LinkError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/thermo.toml for a sample."
            ),
        };
    }

    if let Some(le) = err.downcast_ref::<LinkError>() {
        return match le {
            LinkError::TransportUnavailable(detail) => format!(
                "What happened: The serial port could not be opened ({detail}).\nLikely causes: Wrong device node in [serial].port, cable unplugged, or the port is held by another process.\nHow to fix: Check `thermo ports` for visible devices; on Linux ensure your user is in the dialout group (sudo usermod -a -G dialout $USER), then log out and back in."
            ),
            LinkError::Timeout => "What happened: The device stopped answering within the read timeout.\nLikely causes: Wrong baud rate, wrong port, or the controller is powered off.\nHow to fix: Verify [serial].baud matches the device and consider raising serial.read_timeout_ms.".to_string(),
            LinkError::Io(detail) => format!(
                "What happened: Serial I/O failed ({detail}).\nLikely causes: Cable disconnected mid-session or the USB adapter reset.\nHow to fix: Reconnect the device and start a new session."
            ),
            LinkError::NotConnected => "What happened: A command was issued without a live connection.\nLikely causes: The link was never connected or was already disconnected.\nHow to fix: Connect first (or drop --sim/--config overrides that prevent connecting).".to_string(),
            LinkError::QueueClosed => "What happened: A command was enqueued after shutdown.\nLikely causes: A stale command handle outlived the link.\nHow to fix: This is a programming error in the caller; file a bug.".to_string(),
            LinkError::State(msg) => format!(
                "What happened: Invalid lifecycle transition ({msg}).\nHow to fix: Disconnect before reconnecting, and start delivery only once per connection."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("connection failed") {
        return format!(
            "What happened: {msg}.\nLikely causes: The device went silent or the cable dropped; the link stopped after exhausting its error budget.\nHow to fix: Check wiring and power, then reconnect. Raise poll.error_budget if the line is just noisy."
        );
    }

    if lower.contains("parse config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid.\nDetail: {msg}\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes by error class; unclassified errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(le) = err.downcast_ref::<LinkError>() {
        return match le {
            LinkError::TransportUnavailable(_) => 2,
            LinkError::Timeout => 3,
            LinkError::Io(_) => 4,
            LinkError::NotConnected | LinkError::QueueClosed | LinkError::State(_) => 5,
        };
    }
    if err.to_string().to_ascii_lowercase().contains("connection failed") {
        return 3;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(le) = err.downcast_ref::<LinkError>() {
        match le {
            LinkError::TransportUnavailable(_) => "TransportUnavailable",
            LinkError::Timeout => "Timeout",
            LinkError::Io(_) => "Io",
            LinkError::NotConnected => "NotConnected",
            LinkError::QueueClosed => "QueueClosed",
            LinkError::State(_) => "State",
        }
    } else if err.downcast_ref::<BuildError>().is_some() {
        "InvalidConfig"
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
