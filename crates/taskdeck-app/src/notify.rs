//! Current-value broadcast channel for collection snapshots.
//!
//! Holds the latest full snapshot, replays it to new subscribers
//! immediately, and re-delivers the full updated snapshot (never a diff)
//! to every subscriber on each publish, in subscription order. Delivery is
//! synchronous on the publishing thread. Handlers live for the channel's
//! lifetime; there is no unsubscribe primitive.

use std::fmt;

/// Replay-latest broadcast primitive used by the repository for task and
/// subtask snapshots.
pub struct SnapshotChannel<T> {
    latest: Vec<T>,
    handlers: Vec<Box<dyn FnMut(&[T])>>,
}

impl<T> Default for SnapshotChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotChannel<T> {
    /// Create a channel whose current snapshot is empty.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> &[T] {
        &self.latest
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    /// Register a handler. It is invoked synchronously with the current
    /// snapshot before this call returns, then again after every publish.
    pub fn subscribe(&mut self, mut handler: impl FnMut(&[T]) + 'static) {
        handler(&self.latest);
        self.handlers.push(Box::new(handler));
    }

    /// Replace the current snapshot and deliver it to every subscriber in
    /// subscription order.
    pub fn publish(&mut self, snapshot: Vec<T>) {
        self.latest = snapshot;
        for handler in &mut self.handlers {
            handler(&self.latest);
        }
    }
}

impl<T> fmt::Debug for SnapshotChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotChannel")
            .field("snapshot_len", &self.latest.len())
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
