#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Device-communication core for a serial heater controller.
//!
//! All hardware interaction goes through `thermo_traits::Transport`; this
//! crate owns everything between the transport and the consumer:
//!
//! - **Protocol**: line codec for the device's tagged ASCII responses and
//!   `*`-prefixed directives (`protocol` module)
//! - **Store**: bounded, thread-safe telemetry history (`store` module)
//! - **Queue**: non-blocking operator command queue (`queue` module)
//! - **Poller**: background loop owning the transport; command drain,
//!   round-robin status queries, decode, error budget (`poller` module)
//! - **Delivery**: paced drain-and-callback hand-off to the consumer
//!   (`delivery` module)
//! - **Link**: connection lifecycle facade tying it together (`link`
//!   module)
//!
//! The foreground never blocks on a poll cycle and never sees raw I/O
//! errors, only `ConnectionState` transitions and log lines.

// Module declarations
pub mod config;
pub mod conversions;
pub mod delivery;
pub mod error;
pub mod hw_error;
pub mod link;
pub mod mocks;
pub mod poller;
pub mod protocol;
pub mod queue;
pub mod state;
pub mod store;
pub mod util;

pub use config::{DeliveryCfg, LinkCfg, PollCfg};
pub use delivery::{Delivery, SampleCallback};
pub use error::{BuildError, LinkError, Report, Result};
pub use link::DeviceLink;
pub use poller::{Poller, PollerCtx, QueryCycle, STATUS_QUERIES};
pub use protocol::{Command, DecodeError, Reading, ReadingKind, decode, encode};
pub use queue::{CommandReceiver, CommandSender, command_channel};
pub use state::{ConnectionState, SharedState};
pub use store::{Sample, SampleKind, SampleStore, Snapshot};
