//! Persistence boundary. The timeline only fires saves and watches them
//! settle; what a save does on the other side is the host's business.

pub mod memory;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Deliverable, Phase, ProjectSnapshot};

pub use memory::InMemoryStore;

pub type SaveResult = Result<(), StoreError>;

/// Host-supplied persistence for timeline edits.
pub trait TimelineStore {
    /// The authoritative project collection.
    fn fetch(&self) -> Result<ProjectSnapshot, StoreError>;

    /// Persist a phase. Must not block the caller.
    fn save_phase(&self, phase: Phase) -> PendingSave;

    /// Persist a deliverable under its owning milestone. Must not block.
    fn save_deliverable(&self, milestone_id: Uuid, deliverable: Deliverable) -> PendingSave;
}

/// Handle to a save that is still in flight.
#[derive(Debug)]
pub struct PendingSave {
    rx: Receiver<SaveResult>,
}

impl PendingSave {
    /// A connected pair: the store keeps the sender and settles it later.
    pub fn channel() -> (Sender<SaveResult>, PendingSave) {
        let (tx, rx) = channel::bounded(1);
        (tx, PendingSave { rx })
    }

    /// A save that has already settled.
    pub fn settled(result: SaveResult) -> PendingSave {
        let (tx, pending) = Self::channel();
        // Capacity 1 and the receiver is alive, so this cannot fail.
        let _ = tx.send(result);
        pending
    }

    /// Non-blocking check. `None` while still in flight.
    pub fn poll(&self) -> Option<SaveResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(StoreError::Disconnected)),
        }
    }
}
