use std::collections::HashMap;

use uuid::Uuid;

use crate::model::Bounds;

/// Locally committed bounds that take visual precedence over the server's
/// until the next authoritative collection arrives.
///
/// Kept beside the item list rather than patched into it, so superseding
/// local state on refresh is a single [`clear_all`](Self::clear_all).
#[derive(Debug, Default)]
pub struct OptimisticOverlay {
    entries: HashMap<Uuid, Bounds>,
    seen_revision: Option<u64>,
}

impl OptimisticOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert; last write wins.
    pub fn apply(&mut self, item_id: Uuid, bounds: Bounds) {
        self.entries.insert(item_id, bounds);
    }

    pub fn get(&self, item_id: Uuid) -> Option<Bounds> {
        self.entries.get(&item_id).copied()
    }

    pub fn clear_all(&mut self) {
        if !self.entries.is_empty() {
            tracing::info!(cleared = self.entries.len(), "optimistic overlay superseded");
        }
        self.entries.clear();
    }

    /// Record the identity of the authoritative collection being rendered.
    /// Any change of identity clears every entry. Returns true if it did.
    pub fn observe(&mut self, revision: u64) -> bool {
        if self.seen_revision == Some(revision) {
            return false;
        }
        let changed = self.seen_revision.is_some();
        self.seen_revision = Some(revision);
        if changed {
            self.clear_all();
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
