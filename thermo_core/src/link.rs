//! Device link facade: connection lifecycle plus the handles the
//! foreground needs (`request`, `snapshot`, delivery start/stop).
//!
//! The store, command queue, and notification channel are created once
//! per link and survive reconnects; the transport handle lives inside the
//! polling thread for exactly the span of one connection.

use crossbeam_channel as xch;
use std::sync::Arc;
use thermo_traits::Transport;
use thermo_traits::clock::MonotonicClock;

use crate::config::LinkCfg;
use crate::delivery::{Delivery, SampleCallback};
use crate::error::{BuildError, LinkError, Report, Result};
use crate::poller::{Poller, PollerCtx};
use crate::protocol::Command;
use crate::queue::{CommandReceiver, CommandSender, command_channel};
use crate::state::{ConnectionState, SharedState};
use crate::store::{Sample, SampleStore, Snapshot};

#[derive(Debug)]
pub struct DeviceLink {
    cfg: LinkCfg,
    state: SharedState,
    store: Arc<SampleStore>,
    commands: CommandSender,
    commands_rx: CommandReceiver,
    notify_tx: xch::Sender<Sample>,
    notify_rx: xch::Receiver<Sample>,
    poller: Option<Poller>,
    delivery: Option<Delivery>,
}

impl DeviceLink {
    /// Build a disconnected link. Validates the configuration up front so
    /// misconfiguration surfaces here, not mid-session.
    pub fn new(cfg: LinkCfg) -> Result<Self> {
        if cfg.capacity == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "buffer capacity must be >= 1",
            )));
        }
        if cfg.poll.interval_ms == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "poll interval must be >= 1 ms",
            )));
        }
        if cfg.poll.error_budget == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "error budget must be >= 1",
            )));
        }
        if cfg.poll.read_timeout_ms == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "read timeout must be >= 1 ms",
            )));
        }
        if cfg.delivery.interval_ms == 0 {
            return Err(Report::new(BuildError::InvalidConfig(
                "delivery interval must be >= 1 ms",
            )));
        }

        let store = Arc::new(SampleStore::new(cfg.capacity));
        let (commands, commands_rx) = command_channel();
        let (notify_tx, notify_rx) = xch::unbounded();
        Ok(Self {
            cfg,
            state: SharedState::new(),
            store,
            commands,
            commands_rx,
            notify_tx,
            notify_rx,
            poller: None,
            delivery: None,
        })
    }

    /// Hand a freshly opened transport to a new polling loop.
    ///
    /// The transport is owned exclusively by that loop from here on.
    /// Fails if a connection is already live.
    pub fn connect<T: Transport + Send + 'static>(&mut self, transport: T) -> Result<()> {
        if self.poller.is_some() {
            return Err(Report::new(LinkError::State(
                "already connected; disconnect first".into(),
            )));
        }
        self.state.set(ConnectionState::Connecting);
        let ctx = PollerCtx {
            commands: self.commands_rx.clone(),
            store: self.store.clone(),
            notify: self.notify_tx.clone(),
            state: self.state.clone(),
        };
        self.poller = Some(Poller::spawn(
            transport,
            ctx,
            self.cfg.poll.clone(),
            MonotonicClock::new(),
        ));
        self.state.set(ConnectionState::Connected);
        tracing::info!("device link connected");
        Ok(())
    }

    /// Start the paced consumer hand-off; one scheduler per connection.
    pub fn start_delivery(&mut self, callback: SampleCallback) -> Result<()> {
        if self.delivery.is_some() {
            return Err(Report::new(LinkError::State(
                "delivery already running".into(),
            )));
        }
        if !self.state.is_connected() {
            return Err(Report::new(LinkError::NotConnected));
        }
        self.delivery = Some(Delivery::spawn(
            self.notify_rx.clone(),
            crate::util::interval(self.cfg.delivery.interval_ms),
            self.state.clone(),
            callback,
            MonotonicClock::new(),
        ));
        Ok(())
    }

    /// Queue a directive for the polling loop. Refused while disconnected
    /// rather than silently dropped.
    pub fn request(&self, cmd: Command) -> Result<()> {
        if !self.state.is_connected() {
            return Err(Report::new(LinkError::NotConnected));
        }
        self.commands.send(cmd).map_err(Report::new)
    }

    pub fn set_setpoint(&self, value: f32) -> Result<()> {
        self.request(Command::SetSetpoint(value))
    }

    pub fn set_pid(&self, p: f32, i: f32, d: f32) -> Result<()> {
        self.request(Command::SetPid { p, i, d })
    }

    pub fn set_output(&self, on: bool) -> Result<()> {
        self.request(if on {
            Command::OutputOn
        } else {
            Command::OutputOff
        })
    }

    /// Clonable enqueue handle for other foreground threads. Sends fail
    /// with `QueueClosed` once the link has been dropped.
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Point-in-time copy of the full telemetry history.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Whether the polling loop is still running.
    pub fn polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Stop both background tasks and release the transport. Idempotent;
    /// safe to call even if never connected. Joins are bounded because
    /// every blocking operation inside the loops is itself bounded.
    pub fn disconnect(&mut self) {
        if let Some(delivery) = self.delivery.take() {
            delivery.stop();
        }
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        if self.state.get() != ConnectionState::Disconnected {
            self.state.set(ConnectionState::Disconnected);
            tracing::info!("device link disconnected");
        }
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        self.disconnect();
    }
}
