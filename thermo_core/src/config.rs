//! Runtime configuration for the device link.
//!
//! These are the structs the link and its loops consume at runtime. They
//! are separate from the TOML-deserialized config in `thermo_config`;
//! `crate::conversions` bridges the two.

/// Polling-loop knobs.
#[derive(Debug, Clone)]
pub struct PollCfg {
    /// Pause between poll cycles (ms).
    pub interval_ms: u64,
    /// Consecutive transport errors tolerated before the loop stops and
    /// the connection is marked failed.
    pub error_budget: u32,
    /// Bounded per-read timeout (ms) so one iteration can never hang.
    pub read_timeout_ms: u64,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            error_budget: 10,
            read_timeout_ms: 500,
        }
    }
}

/// Delivery-scheduler knobs.
#[derive(Debug, Clone)]
pub struct DeliveryCfg {
    /// Consumer callback cadence (ms).
    pub interval_ms: u64,
}

impl Default for DeliveryCfg {
    fn default() -> Self {
        Self { interval_ms: 150 }
    }
}

/// Full link configuration.
#[derive(Debug, Clone)]
pub struct LinkCfg {
    pub poll: PollCfg,
    pub delivery: DeliveryCfg,
    /// Shared ring-buffer capacity for the sample store.
    pub capacity: usize,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self {
            poll: PollCfg::default(),
            delivery: DeliveryCfg::default(),
            capacity: 10_000,
        }
    }
}
