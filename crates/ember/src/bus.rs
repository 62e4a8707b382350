//! # The Notification Bus
//!
//! A channel-backed [`NotificationSink`] for headless runs: managers push
//! messages from timer tasks without blocking, and the application drains
//! them whenever it likes (or hands the receiver to a delivery loop).

use crossbeam_channel::{unbounded, Receiver, Sender};

use ember_core::{NotificationSink, NotifyTarget};

/// One outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Addressee.
    pub target: NotifyTarget,
    /// Message text.
    pub message: String,
}

/// Unbounded channel sink.
#[derive(Debug)]
pub struct NotificationBus {
    tx: Sender<Notification>,
    rx: Receiver<Notification>,
}

impl NotificationBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// A receiver end for a delivery loop. Clones share the same stream;
    /// each message is seen by exactly one receiver.
    #[must_use]
    pub fn receiver(&self) -> Receiver<Notification> {
        self.rx.clone()
    }

    /// Drains everything currently buffered, in send order.
    #[must_use]
    pub fn try_drain(&self) -> Vec<Notification> {
        self.rx.try_iter().collect()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NotificationBus {
    fn notify(&self, target: NotifyTarget, message: &str) {
        // The bus owns a receiver, so the channel cannot be disconnected.
        let _ = self.tx.send(Notification {
            target,
            message: message.to_string(),
        });
    }
}
