//! Signal delivery for pipeline dispatches.
//!
//! One [`SignalChannel`] is shared by every stage of a dispatch. Emitting a
//! signal notifies all currently subscribed listeners; there is no queue for
//! late subscribers — a listener that subscribes after an emission misses it.
//! Listeners are discarded with the stage contexts that hold them.
//!
//! Only foreground interrupt delivery is modeled; there is no job control.

use tokio::sync::broadcast;

/// Signals the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Interrupt the foreground pipeline (conventionally Ctrl-C).
    Interrupt,
}

/// Cloneable broadcast handle for signal delivery.
///
/// Cloning shares the underlying channel; every clone emits to the same set
/// of subscribers.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    tx: broadcast::Sender<Signal>,
}

impl SignalChannel {
    /// Create a new signal channel.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Emit a signal to all current subscribers.
    ///
    /// Returns the number of subscribers notified. Zero subscribers is not
    /// an error — nobody was listening.
    pub fn emit(&self, signal: Signal) -> usize {
        self.tx.send(signal).unwrap_or(0)
    }

    /// Subscribe to future signals. Signals emitted before this call are
    /// not delivered.
    pub fn subscribe(&self) -> SignalReceiver {
        SignalReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SignalChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`SignalChannel`] subscription.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: broadcast::Receiver<Signal>,
}

impl SignalReceiver {
    /// Wait for the next signal.
    ///
    /// Returns `None` when every sender handle has been dropped. A lagged
    /// receiver skips to the most recent signals rather than erroring.
    pub async fn recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.recv().await {
                Ok(signal) => return Some(signal),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
