//! Delivery scheduler: paced hand-off of fresh samples to the consumer.
//!
//! A second background thread drains the notification channel at a fixed
//! interval and invokes the registered callback with the batch collected
//! since the previous tick: each sample delivered exactly once, an empty
//! batch when nothing arrived. This decouples the consumer's cadence
//! (rendering, persistence) from the transport's poll cadence and keeps
//! the consumer single-threaded.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thermo_traits::clock::Clock;

use crate::state::SharedState;
use crate::store::Sample;

/// Consumer callback invoked once per tick with the drained batch.
pub type SampleCallback = Box<dyn FnMut(Vec<Sample>) + Send>;

#[derive(Debug)]
pub struct Delivery {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Delivery {
    /// Spawn the scheduler thread. Runs until stopped or until the
    /// connection leaves `Connected`.
    pub fn spawn<C>(
        rx: xch::Receiver<Sample>,
        interval: Duration,
        state: SharedState,
        mut callback: SampleCallback,
        clock: C,
    ) -> Self
    where
        C: Clock + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("delivery thread received shutdown signal");
                    break;
                }
                if !state.is_connected() {
                    tracing::debug!("connection no longer active, stopping delivery");
                    break;
                }

                let batch: Vec<Sample> = rx.try_iter().collect();
                callback(batch);

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(interval);
            }
            tracing::trace!("delivery thread exiting cleanly");
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Signal the scheduler and wait for any in-flight callback to finish.
    /// No callback runs after this returns.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("delivery thread joined"),
                Err(e) => tracing::warn!(?e, "delivery thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
