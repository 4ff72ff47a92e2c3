//! Shared state plumbing: the current-file bus and the readiness signal.
//!
//! Panels used to discover shared state through globals and poll for it
//! with timers. Here both patterns are explicit values owned by the
//! composition root and handed to consumers: [`FileBus`] broadcasts the
//! current file, [`Readiness`] resolves exactly once when the host is up.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

// =============================================================================
// File bus
// =============================================================================

/// Snapshot of the most recently uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    pub file_name: String,
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// Broadcast channel for the current file, with a queryable latest value.
///
/// `subscribe` returns a [`Subscription`]; dropping it unsubscribes, so a
/// closed panel cannot keep receiving (and leaking) events.
pub struct FileBus {
    current: Mutex<Option<FileSnapshot>>,
    sender: broadcast::Sender<FileSnapshot>,
}

impl FileBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { current: Mutex::new(None), sender }
    }

    /// Replace the current snapshot and notify all subscribers.
    pub fn publish(&self, snapshot: FileSnapshot) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = Some(snapshot.clone());
        drop(current);
        // No subscribers is fine; the snapshot is still queryable.
        let _ = self.sender.send(snapshot);
    }

    /// The latest published snapshot, if any.
    pub fn get_state(&self) -> Option<FileSnapshot> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription { rx: self.sender.subscribe() }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for FileBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to the file bus. Drop it to unsubscribe.
pub struct Subscription {
    rx: broadcast::Receiver<FileSnapshot>,
}

impl Subscription {
    /// Next published snapshot; `None` once the bus is gone. Skips over
    /// lagged gaps rather than failing.
    pub async fn next(&mut self) -> Option<FileSnapshot> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// Readiness
// =============================================================================

/// Create a readiness pair: the root keeps the [`Readiness`] and calls
/// `set_ready` once; consumers each hold a [`ReadySignal`] and await it
/// instead of polling.
pub fn readiness() -> (Readiness, ReadySignal) {
    let (tx, rx) = watch::channel(false);
    (Readiness { tx }, ReadySignal { rx })
}

/// Write half of the readiness signal.
pub struct Readiness {
    tx: watch::Sender<bool>,
}

impl Readiness {
    /// Mark the host ready. Calling again is a no-op; readiness never
    /// reverts.
    pub fn set_ready(&self) {
        let _ = self.tx.send(true);
    }
}

/// Read half of the readiness signal; clone one per consumer.
#[derive(Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<bool>,
}

impl ReadySignal {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the root has called `set_ready`. Resolves immediately
    /// for late subscribers, and also when the write half is dropped (a
    /// consumer must never hang on a root that went away).
    pub async fn ready(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
