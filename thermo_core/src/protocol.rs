//! Line codec for the heater controller's ASCII protocol.
//!
//! Requests are short `*`-prefixed directives terminated by `;`; responses
//! are single lines starting with a fixed tag followed by a fixed-width
//! numeric field, optionally carrying a trailing unit letter. Encoding and
//! decoding are pure: no I/O, no shared state.

use thiserror::Error;

/// Terminator appended to every outbound directive.
pub const LINE_TERMINATOR: &str = "\r\n";

/// An operator or poll directive for the device.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `*GETTPRS;`, asking for the commanded setpoint
    QuerySetpoint,
    /// `*GETTACT;`, asking for the measured temperature
    QueryTemperature,
    /// `*GETIOUT;`, asking for the output current
    QueryCurrent,
    /// `*SETTPRS<v>;`, commanding a new setpoint (degrees C)
    SetSetpoint(f32),
    /// `*SETCK<p> <i> <d>;`, forwarding PID coefficients to the device
    SetPid { p: f32, i: f32, d: f32 },
    /// `A`, enabling the heater output
    OutputOn,
    /// `a`, disabling the heater output
    OutputOff,
    /// Escape hatch: send a directive verbatim
    Raw(String),
}

impl Command {
    /// Wire rendering without the line terminator.
    pub fn render(&self) -> String {
        match self {
            Command::QuerySetpoint => "*GETTPRS;".to_string(),
            Command::QueryTemperature => "*GETTACT;".to_string(),
            Command::QueryCurrent => "*GETIOUT;".to_string(),
            Command::SetSetpoint(v) => format!("*SETTPRS{v};"),
            Command::SetPid { p, i, d } => format!("*SETCK{p:.1} {i:.1} {d:.1};"),
            Command::OutputOn => "A".to_string(),
            Command::OutputOff => "a".to_string(),
            Command::Raw(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Render a directive and append the device line terminator.
pub fn encode(cmd: &Command) -> Vec<u8> {
    let mut out = cmd.render();
    out.push_str(LINE_TERMINATOR);
    out.into_bytes()
}

/// What a decoded response line measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Temperature,
    Current,
    /// Device-confirmed setpoint (response to `*GETTPRS;`)
    SetpointEcho,
}

/// A tagged value extracted from one response line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub kind: ReadingKind,
    pub value: f32,
}

/// A response line matched a known tag but its numeric field did not parse.
///
/// Distinct from "no matching tag" (`Ok(None)` from [`decode`]) so callers
/// can log malformed traffic without treating foreign lines as faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed {tag} response: field `{field}` is not numeric")]
pub struct DecodeError {
    pub tag: &'static str,
    pub field: String,
}

// Numeric field windows, in bytes from line start. The TPRS/TACT value
// occupies [5..12]; the IOUT value sits deeper at [9..15] and carries a
// trailing ampere marker.
const TAG_SETPOINT: &str = "*TPRS ";
const TAG_TEMPERATURE: &str = "*TACT ";
const TAG_CURRENT: &str = "*IOUT ";
const VALUE_WINDOW: (usize, usize) = (5, 12);
const CURRENT_WINDOW: (usize, usize) = (9, 15);

/// Decode one response line.
///
/// Returns `Ok(None)` for lines that carry no known tag, `Ok(Some(..))`
/// for a well-formed reading, and `Err` when a tag matched but the field
/// is not numeric. The window is clamped to the line length, so short
/// lines still parse as long as the digits they do carry are valid.
pub fn decode(line: &str) -> Result<Option<Reading>, DecodeError> {
    let (kind, tag, window) = if line.starts_with(TAG_TEMPERATURE) {
        (ReadingKind::Temperature, "*TACT", VALUE_WINDOW)
    } else if line.starts_with(TAG_CURRENT) {
        (ReadingKind::Current, "*IOUT", CURRENT_WINDOW)
    } else if line.starts_with(TAG_SETPOINT) {
        (ReadingKind::SetpointEcho, "*TPRS", VALUE_WINDOW)
    } else {
        return Ok(None);
    };

    // Tags are ASCII; a non-ASCII payload can only be line noise.
    if !line.is_ascii() {
        return Err(DecodeError {
            tag,
            field: line.chars().skip(window.0).take(window.1 - window.0).collect(),
        });
    }

    let (start, end) = (window.0.min(line.len()), window.1.min(line.len()));
    let field = &line[start..end];
    let numeric = field
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic());
    match numeric.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(Some(Reading { kind, value })),
        _ => Err(DecodeError {
            tag,
            field: field.to_string(),
        }),
    }
}
