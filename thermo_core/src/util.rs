//! Common time and filesystem helpers for thermo_core.

use std::time::Duration;
use std::{fs, io::Write, path::Path};

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Build a loop pause from a configured interval in milliseconds.
/// Clamps to at least 1 ms so a zero interval cannot busy-spin a loop.
#[inline]
pub fn interval(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

/// Convert elapsed milliseconds to fractional seconds for timestamps.
#[inline]
pub fn ms_to_s(ms: u64) -> f64 {
    ms as f64 / MILLIS_PER_SEC as f64
}

/// Write `bytes` to `path` via a temp file + rename so a crash mid-write
/// never leaves a truncated artifact behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
