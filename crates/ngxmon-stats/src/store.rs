//! Single-slot previous-snapshot storage.

use crate::snapshot::Snapshot;

/// Holds the snapshot of the last successful poll.
///
/// Empty at startup; replaced after every successful poll, whether or not
/// that poll's deltas were computable. Failed polls leave it untouched, so
/// the next successful poll diffs against the last good snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    previous: Option<Snapshot>,
}

impl SnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored snapshot, `None` before the first successful poll.
    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Whether no poll has succeeded yet.
    pub fn is_empty(&self) -> bool {
        self.previous.is_none()
    }

    /// Store `snapshot`, returning the one it replaces.
    pub fn replace(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.previous.replace(snapshot)
    }
}
