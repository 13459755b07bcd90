//! Single-producer/single-consumer operator command queue.
//!
//! The foreground enqueues without blocking; the polling loop drains at
//! most one command per cycle so operator directives interleave with the
//! standard status queries instead of starving them. FIFO throughout.

use crossbeam_channel as xch;

use crate::error::LinkError;
use crate::protocol::Command;

/// Create the command channel pair. Unbounded, so `send` never blocks.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = xch::unbounded();
    (CommandSender(tx), CommandReceiver(rx))
}

/// Foreground handle; clone freely across threads.
#[derive(Debug, Clone)]
pub struct CommandSender(xch::Sender<Command>);

impl CommandSender {
    /// Enqueue a command. Fails only once every receiver is gone, which
    /// signals enqueue-after-shutdown misuse.
    pub fn send(&self, cmd: Command) -> Result<(), LinkError> {
        self.0.send(cmd).map_err(|_| LinkError::QueueClosed)
    }
}

/// Polling-loop handle.
#[derive(Debug, Clone)]
pub struct CommandReceiver(xch::Receiver<Command>);

impl CommandReceiver {
    /// Non-blocking dequeue of the oldest pending command.
    pub fn try_dequeue(&self) -> Option<Command> {
        self.0.try_recv().ok()
    }
}
