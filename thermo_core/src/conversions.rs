//! `From` implementations bridging `thermo_config` types to `thermo_core`
//! types, so callers never map fields by hand.

use crate::config::{DeliveryCfg, LinkCfg, PollCfg};

impl From<&thermo_config::DeliveryCfg> for DeliveryCfg {
    fn from(c: &thermo_config::DeliveryCfg) -> Self {
        Self {
            interval_ms: c.interval_ms,
        }
    }
}

// The runtime poll config folds in the serial read timeout, since the
// polling loop is the only reader; hence the whole-config source.
impl From<&thermo_config::Config> for LinkCfg {
    fn from(c: &thermo_config::Config) -> Self {
        Self {
            poll: PollCfg {
                interval_ms: c.poll.interval_ms,
                error_budget: c.poll.error_budget,
                read_timeout_ms: c.serial.read_timeout_ms,
            },
            delivery: (&c.delivery).into(),
            capacity: c.buffer.capacity,
        }
    }
}
