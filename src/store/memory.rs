//! Store kept in process memory. Writes are applied on a worker thread after
//! a simulated round trip so the UI sees real in-flight saves.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use uuid::Uuid;

use super::{PendingSave, SaveResult, TimelineStore};
use crate::error::StoreError;
use crate::model::{Deliverable, Phase, Project, ProjectSnapshot};

enum StoreOp {
    SavePhase {
        phase: Phase,
        respond: Sender<SaveResult>,
    },
    SaveDeliverable {
        milestone_id: Uuid,
        deliverable: Deliverable,
        respond: Sender<SaveResult>,
    },
    Shutdown,
}

struct Shared {
    project: Project,
    revision: u64,
}

pub struct InMemoryStore {
    shared: Arc<Mutex<Shared>>,
    ops: Sender<StoreOp>,
    worker: Option<JoinHandle<()>>,
}

impl InMemoryStore {
    pub fn new(project: Project, latency: Duration) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            project,
            revision: 0,
        }));
        let (ops, rx) = channel::unbounded();
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("timeline-store".into())
            .spawn(move || run_worker(worker_shared, rx, latency))
            .map_err(|err| tracing::warn!("store worker failed to start: {err}"))
            .ok();

        Self {
            shared,
            ops,
            worker,
        }
    }

    /// Current server-side project, for inspection.
    pub fn project(&self) -> Project {
        lock(&self.shared).project.clone()
    }

    fn submit(&self, op: impl FnOnce(Sender<SaveResult>) -> StoreOp) -> PendingSave {
        let (respond, pending) = PendingSave::channel();
        if self.ops.send(op(respond)).is_err() {
            return PendingSave::settled(Err(StoreError::Disconnected));
        }
        pending
    }
}

impl TimelineStore for InMemoryStore {
    /// Every fetch hands out a fresh collection with a new revision, even
    /// when nothing changed, as a refetch from a remote service would.
    fn fetch(&self) -> Result<ProjectSnapshot, StoreError> {
        let mut shared = lock(&self.shared);
        shared.revision += 1;
        Ok(ProjectSnapshot::new(shared.revision, shared.project.clone()))
    }

    fn save_phase(&self, phase: Phase) -> PendingSave {
        self.submit(|respond| StoreOp::SavePhase { phase, respond })
    }

    fn save_deliverable(&self, milestone_id: Uuid, deliverable: Deliverable) -> PendingSave {
        self.submit(|respond| StoreOp::SaveDeliverable {
            milestone_id,
            deliverable,
            respond,
        })
    }
}

impl Drop for InMemoryStore {
    fn drop(&mut self) {
        let _ = self.ops.send(StoreOp::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn run_worker(shared: Arc<Mutex<Shared>>, rx: Receiver<StoreOp>, latency: Duration) {
    while let Ok(op) = rx.recv() {
        let (result, respond) = match op {
            StoreOp::Shutdown => break,
            StoreOp::SavePhase { phase, respond } => {
                std::thread::sleep(latency);
                (apply_phase(&mut lock(&shared).project, phase), respond)
            }
            StoreOp::SaveDeliverable {
                milestone_id,
                deliverable,
                respond,
            } => {
                std::thread::sleep(latency);
                (
                    apply_deliverable(&mut lock(&shared).project, milestone_id, deliverable),
                    respond,
                )
            }
        };
        if let Err(err) = &result {
            tracing::warn!("store rejected write: {err}");
        }
        // The caller may have stopped waiting; that is fine.
        let _ = respond.send(result);
    }
    tracing::debug!("store worker stopped");
}

fn check_order(start: Option<chrono::NaiveDate>, end: Option<chrono::NaiveDate>) -> SaveResult {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(StoreError::InvertedDates {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => Ok(()),
    }
}

fn apply_phase(project: &mut Project, phase: Phase) -> SaveResult {
    check_order(phase.start_date, phase.end_date)?;
    let id = phase.id;
    if project.replace_phase(phase) {
        Ok(())
    } else {
        Err(StoreError::PhaseNotFound(id))
    }
}

fn apply_deliverable(project: &mut Project, milestone_id: Uuid, deliverable: Deliverable) -> SaveResult {
    check_order(deliverable.start_date, deliverable.end_date)?;
    let deliverable_id = deliverable.id;
    if project.replace_deliverable(milestone_id, deliverable) {
        Ok(())
    } else {
        Err(StoreError::DeliverableNotFound {
            milestone_id,
            deliverable_id,
        })
    }
}
