//! Fan-out of scan events to subscribers

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::debug;

use crate::types::ScanEvent;

/// Destination for decoded reads.
///
/// RFID events are published on the reader thread, barcode events on the
/// thread that delivered the notification. No arbiter lock is held during
/// `publish`, so an implementation may query the arbiter or issue a mode
/// command itself. It must not wait on a command issued by another thread,
/// since that command may be joining the reader thread.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ScanEvent);
}

/// Publishes every event to all live subscribers.
///
/// Subscribers that dropped their [`Subscription`] are pruned on the next publish.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<ScanEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. Only events published afterwards are delivered.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Subscription { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: ScanEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!("Published {} to {} subscribers", event.tagged(), subscribers.len());
    }
}

/// Receiving end of an [`EventBus`] subscription
pub struct Subscription {
    rx: Receiver<ScanEvent>,
}

impl Subscription {
    /// Block until the next event
    pub fn recv(&self) -> Option<ScanEvent> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<ScanEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take an event if one is pending
    pub fn try_recv(&self) -> Option<ScanEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ScanEvent> + '_ {
        self.rx.iter()
    }
}
