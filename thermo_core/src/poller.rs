//! Background polling loop.
//!
//! Spawns a thread that owns the transport exclusively, drains at most one
//! operator command per cycle, cycles through the standard status queries,
//! decodes responses into the shared store, and forwards fresh samples on
//! the notification channel. Transient I/O faults are absorbed up to a
//! consecutive-error budget; exhausting it marks the connection `Failed`
//! and stops the loop.
//!
//! Safety: each `Poller` spawns exactly one thread that is automatically
//! shut down when the `Poller` is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thermo_traits::Transport;
use thermo_traits::clock::Clock;

use crate::config::PollCfg;
use crate::hw_error::map_transport_error;
use crate::protocol::{self, Command};
use crate::queue::CommandReceiver;
use crate::state::{ConnectionState, SharedState};
use crate::store::{Sample, SampleStore};
use crate::util;

/// Fixed round-robin cycle of status queries, issued whenever the
/// transport has nothing buffered to read.
pub static STATUS_QUERIES: [Command; 3] = [
    Command::QuerySetpoint,
    Command::QueryTemperature,
    Command::QueryCurrent,
];

/// Explicit round-robin index over [`STATUS_QUERIES`].
#[derive(Debug, Default)]
pub struct QueryCycle {
    idx: usize,
}

impl QueryCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The query to issue next; advances and wraps.
    pub fn next(&mut self) -> &'static Command {
        let cmd = &STATUS_QUERIES[self.idx];
        self.idx = (self.idx + 1) % STATUS_QUERIES.len();
        cmd
    }
}

/// Shared resources the loop writes into.
pub struct PollerCtx {
    pub commands: CommandReceiver,
    pub store: Arc<SampleStore>,
    pub notify: xch::Sender<Sample>,
    pub state: SharedState,
}

enum CycleFlow {
    Continue,
    ConsumerGone,
}

/// One poll cycle: operator command, then either a status query (idle
/// transport) or a read-decode-dispatch (bytes pending).
///
/// `errors` is the consecutive-error counter: any successful send or
/// received line resets it, any transport fault increments it. Decode
/// failures are logged and deliberately left out of the count. A query is
/// written only when nothing is buffered: the device is assumed to have
/// a single query outstanding at a time, as the protocol intends.
fn run_cycle<T: Transport>(
    transport: &mut T,
    ctx: &PollerCtx,
    cycle: &mut QueryCycle,
    errors: &mut u32,
    read_timeout: Duration,
    timestamp_s: f64,
) -> CycleFlow {
    if let Some(cmd) = ctx.commands.try_dequeue() {
        tracing::debug!(command = %cmd, "sending operator command");
        match transport.send(&protocol::encode(&cmd)) {
            Ok(()) => *errors = 0,
            Err(e) => {
                *errors += 1;
                tracing::warn!(error = %map_transport_error(e.as_ref()), "command write failed");
                return CycleFlow::Continue;
            }
        }
    }

    match transport.bytes_available() {
        Ok(0) => {
            let query = cycle.next();
            match transport.send(&protocol::encode(query)) {
                Ok(()) => *errors = 0,
                Err(e) => {
                    *errors += 1;
                    tracing::warn!(error = %map_transport_error(e.as_ref()), "status query failed");
                }
            }
        }
        Ok(_) => match transport.read_line(read_timeout) {
            Ok(Some(line)) => {
                *errors = 0;
                match protocol::decode(&line) {
                    Ok(Some(reading)) => {
                        let sample = Sample {
                            kind: reading.kind,
                            value: reading.value,
                            timestamp_s,
                        };
                        ctx.store.record(&sample);
                        if ctx.notify.send(sample).is_err() {
                            tracing::debug!("sample consumer disconnected, exiting poll loop");
                            return CycleFlow::ConsumerGone;
                        }
                    }
                    Ok(None) => tracing::trace!(%line, "ignoring unrecognized response"),
                    Err(e) => tracing::warn!(error = %e, "discarding malformed response"),
                }
            }
            // Silent device: nothing arrived before the bounded timeout.
            // Neither a success nor a fault.
            Ok(None) => {}
            Err(e) => {
                *errors += 1;
                tracing::warn!(error = %map_transport_error(e.as_ref()), "read failed");
            }
        },
        Err(e) => {
            *errors += 1;
            tracing::warn!(error = %map_transport_error(e.as_ref()), "transport status check failed");
        }
    }

    CycleFlow::Continue
}

#[derive(Debug)]
pub struct Poller {
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Poller {
    /// Spawn the polling thread. The transport moves into the thread and
    /// is dropped (releasing the handle) when the loop exits.
    pub fn spawn<T, C>(mut transport: T, ctx: PollerCtx, cfg: PollCfg, clock: C) -> Self
    where
        T: Transport + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let pause = util::interval(cfg.interval_ms);
        let read_timeout = util::interval(cfg.read_timeout_ms);
        let budget = cfg.error_budget.max(1);

        let join_handle = std::thread::spawn(move || {
            let epoch = clock.now();
            let mut cycle = QueryCycle::new();
            let mut errors: u32 = 0;

            loop {
                // Immediate shutdown check (lock-free atomic)
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("poll loop received shutdown signal");
                    break;
                }

                let timestamp_s = util::ms_to_s(clock.ms_since(epoch));
                match run_cycle(
                    &mut transport,
                    &ctx,
                    &mut cycle,
                    &mut errors,
                    read_timeout,
                    timestamp_s,
                ) {
                    CycleFlow::Continue => {}
                    CycleFlow::ConsumerGone => break,
                }

                if errors >= budget {
                    tracing::error!(errors, budget, "error budget exhausted, stopping poll loop");
                    ctx.state.set(ConnectionState::Failed(format!(
                        "{errors} consecutive transport errors"
                    )));
                    break;
                }

                // Check shutdown before sleep to avoid unnecessary delay
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(pause);
            }
            tracing::trace!("poll loop thread exiting cleanly");
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Whether the loop thread has exited (stopped or budget-failed).
    pub fn is_finished(&self) -> bool {
        self.join_handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Signal the loop and wait for it to exit. Every blocking operation
    /// inside the loop is timeout-bounded, so the join is too.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("poll loop thread joined"),
                Err(e) => tracing::warn!(?e, "poll loop thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_cycle_wraps_in_order() {
        let mut cycle = QueryCycle::new();
        let first: Vec<_> = (0..6).map(|_| cycle.next().clone()).collect();
        assert_eq!(
            first,
            vec![
                Command::QuerySetpoint,
                Command::QueryTemperature,
                Command::QueryCurrent,
                Command::QuerySetpoint,
                Command::QueryTemperature,
                Command::QueryCurrent,
            ]
        );
    }
}
