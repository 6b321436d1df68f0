//! Composition root for the timeline: owns the authoritative snapshot, the
//! optimistic overlay, the drag controller and the saves still in flight.

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::TimelineConfig;
use crate::error::StoreError;
use crate::interaction::{DragCommit, DragController, DragOperation, OptimisticOverlay};
use crate::layout::{build_layout, BoundsResolver, BoundsSource, TimelineLayout};
use crate::model::{Bounds, ItemRef, Project, ProjectSnapshot, TimelineWindow};
use crate::store::{PendingSave, SaveResult, TimelineStore};

#[derive(Debug)]
struct InFlightSave {
    item: ItemRef,
    pending: PendingSave,
}

/// A save that finished during [`TimelineState::poll`].
#[derive(Debug, Clone, PartialEq)]
pub struct SettledSave {
    pub item: ItemRef,
    pub result: SaveResult,
}

pub struct TimelineState {
    snapshot: ProjectSnapshot,
    overlay: OptimisticOverlay,
    drag: DragController,
    in_flight: Vec<InFlightSave>,
}

impl TimelineState {
    pub fn new(snapshot: ProjectSnapshot) -> Self {
        let mut overlay = OptimisticOverlay::new();
        overlay.observe(snapshot.revision);
        Self {
            snapshot,
            overlay,
            drag: DragController::new(),
            in_flight: Vec::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.snapshot.project
    }

    pub fn revision(&self) -> u64 {
        self.snapshot.revision
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn overlay(&self) -> &OptimisticOverlay {
        &self.overlay
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn window(&self, config: &TimelineConfig, today: NaiveDate) -> TimelineWindow {
        TimelineWindow::for_project(self.project(), config.window_padding_ratio, today)
    }

    /// Bounds an item is drawn at right now: live drag, then overlay, then
    /// server state.
    pub fn effective_bounds(&self, item: ItemRef) -> Option<Bounds> {
        let committed = self.project().committed_bounds(item)?;
        Some(self.resolve(item, committed).0)
    }

    /// Install a freshly fetched collection. A new identity supersedes every
    /// optimistic entry.
    pub fn replace_snapshot(&mut self, snapshot: ProjectSnapshot) {
        if self.overlay.observe(snapshot.revision) {
            tracing::info!(revision = snapshot.revision, "authoritative project refreshed");
        }
        self.snapshot = snapshot;
    }

    pub fn begin_drag(&mut self, operation: DragOperation, item: ItemRef, pointer_x: f32) -> bool {
        let bounds = self.effective_bounds(item);
        self.drag.begin(operation, item, pointer_x, bounds)
    }

    pub fn update_drag(&mut self, pointer_x: f32, window: &TimelineWindow, track_width_px: f32) -> Option<Bounds> {
        self.drag.update(pointer_x, window, track_width_px)
    }

    /// Pointer-up: finish the gesture and persist it.
    pub fn release_drag(&mut self, store: &dyn TimelineStore) -> Option<DragCommit> {
        let commit = self.drag.release()?;
        self.commit_drag(commit, store);
        Some(commit)
    }

    /// Record the overlay entry, then dispatch exactly one save. The overlay
    /// is written first so any frame drawn while the save is in flight shows
    /// the new bounds.
    pub fn commit_drag(&mut self, commit: DragCommit, store: &dyn TimelineStore) -> bool {
        let project = &self.snapshot.project;
        let pending = match commit.target {
            ItemRef::Phase(id) => {
                let Some(phase) = project.phase(id) else {
                    tracing::warn!(%id, "dragged phase vanished before commit");
                    return false;
                };
                let updated = phase.with_bounds(commit.bounds);
                self.overlay.apply(id, commit.bounds);
                store.save_phase(updated)
            }
            ItemRef::Deliverable {
                milestone_id,
                deliverable_id,
            } => {
                let Some(deliverable) = project.deliverable(milestone_id, deliverable_id) else {
                    tracing::warn!(%deliverable_id, "dragged deliverable vanished before commit");
                    return false;
                };
                let updated = deliverable.with_bounds(commit.bounds);
                self.overlay.apply(deliverable_id, commit.bounds);
                store.save_deliverable(milestone_id, updated)
            }
            ItemRef::Milestone(_) => return false,
        };

        self.in_flight.push(InFlightSave {
            item: commit.target,
            pending,
        });
        true
    }

    /// Collect settled saves. Once nothing is left in flight the
    /// authoritative project is refetched, which clears the overlay; a failed
    /// save is therefore superseded rather than rolled back.
    pub fn poll(&mut self, store: &dyn TimelineStore) -> Vec<SettledSave> {
        let mut settled = Vec::new();
        self.in_flight.retain(|save| match save.pending.poll() {
            Some(result) => {
                settled.push(SettledSave {
                    item: save.item,
                    result,
                });
                false
            }
            None => true,
        });

        for save in &settled {
            match &save.result {
                Ok(()) => tracing::debug!(item = ?save.item, "save confirmed"),
                Err(err) => tracing::warn!(item = ?save.item, "save failed: {err}"),
            }
        }

        if !settled.is_empty() && self.in_flight.is_empty() {
            if let Err(err) = self.refresh(store) {
                tracing::warn!("refetch after save failed: {err}");
            }
        }
        settled
    }

    pub fn refresh(&mut self, store: &dyn TimelineStore) -> Result<(), StoreError> {
        let snapshot = store.fetch()?;
        self.replace_snapshot(snapshot);
        Ok(())
    }

    pub fn layout(&self, config: &TimelineConfig, now: DateTime<Utc>) -> TimelineLayout {
        let window = self.window(config, now.date_naive());
        build_layout(self.project(), window, self, config, now)
    }
}

impl BoundsResolver for TimelineState {
    fn resolve(&self, item: ItemRef, committed: Bounds) -> (Bounds, BoundsSource) {
        if let Some(live) = self.drag.live_bounds(item) {
            return (live, BoundsSource::Live);
        }
        match self.overlay.get(item.id()) {
            Some(optimistic) => (optimistic, BoundsSource::Optimistic),
            None => (committed, BoundsSource::Committed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crossbeam::channel::Sender;
    use uuid::Uuid;

    use crate::model::timeline::to_timestamp;
    use crate::model::{Deliverable, Milestone, Phase, ProjectConfig, Workstream};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Store whose saves settle only when the test says so.
    struct ManualStore {
        project: RefCell<Project>,
        revision: RefCell<u64>,
        responders: RefCell<Vec<Sender<SaveResult>>>,
        saves: RefCell<Vec<ItemRef>>,
    }

    impl ManualStore {
        fn new(project: Project) -> Self {
            Self {
                project: RefCell::new(project),
                revision: RefCell::new(0),
                responders: RefCell::new(Vec::new()),
                saves: RefCell::new(Vec::new()),
            }
        }

        fn settle(&self, index: usize, result: SaveResult) {
            self.responders.borrow()[index].send(result).unwrap();
        }
    }

    impl TimelineStore for ManualStore {
        fn fetch(&self) -> Result<ProjectSnapshot, StoreError> {
            *self.revision.borrow_mut() += 1;
            Ok(ProjectSnapshot::new(*self.revision.borrow(), self.project.borrow().clone()))
        }

        fn save_phase(&self, phase: Phase) -> PendingSave {
            self.saves.borrow_mut().push(ItemRef::Phase(phase.id));
            self.project.borrow_mut().replace_phase(phase);
            let (tx, pending) = PendingSave::channel();
            self.responders.borrow_mut().push(tx);
            pending
        }

        fn save_deliverable(&self, milestone_id: Uuid, deliverable: Deliverable) -> PendingSave {
            self.saves.borrow_mut().push(ItemRef::Deliverable {
                milestone_id,
                deliverable_id: deliverable.id,
            });
            let (tx, pending) = PendingSave::channel();
            self.responders.borrow_mut().push(tx);
            pending
        }
    }

    struct Fixture {
        store: ManualStore,
        state: TimelineState,
        phase: ItemRef,
        deliverable: ItemRef,
    }

    fn fixture() -> Fixture {
        let mut project = Project::new("Portfolio");
        project.config = ProjectConfig::from_dates(d("2025-01-01"), d("2025-12-31"));
        let stream = Workstream::new("Platform");

        let phase = Phase::new("Design", d("2025-03-01"), d("2025-03-31"));
        let phase_ref = ItemRef::Phase(phase.id);

        let mut milestone = Milestone::new("Beta", d("2025-03-01"));
        let mut deliverable = Deliverable::new("D1", d("2025-02-01"), d("2025-02-10"));
        deliverable.workstream_id = Some(stream.id);
        let deliverable_ref = ItemRef::Deliverable {
            milestone_id: milestone.id,
            deliverable_id: deliverable.id,
        };
        milestone.deliverables.push(deliverable);

        project.workstreams.push(stream);
        project.phases.push(phase);
        project.milestones.push(milestone);

        let store = ManualStore::new(project);
        let state = TimelineState::new(store.fetch().unwrap());
        Fixture {
            store,
            state,
            phase: phase_ref,
            deliverable: deliverable_ref,
        }
    }

    fn now() -> DateTime<Utc> {
        to_timestamp(d("2025-02-01"))
    }

    // One pixel per day across the 2025 window.
    const TRACK_PX: f32 = 364.0;

    fn drag_by(fx: &mut Fixture, item: ItemRef, operation: DragOperation, px: f32) -> DragCommit {
        let window = fx.state.window(&TimelineConfig::default(), now().date_naive());
        assert!(fx.state.begin_drag(operation, item, 100.0));
        fx.state.update_drag(100.0 + px, &window, TRACK_PX);
        fx.state.release_drag(&fx.store).unwrap()
    }

    #[test]
    fn moved_deliverable_renders_at_new_position_before_save_settles() {
        let mut fx = fixture();
        let config = TimelineConfig::default();
        let before = fx.state.layout(&config, now()).bar(fx.deliverable).unwrap().left;

        let item = fx.deliverable;
        let commit = drag_by(&mut fx, item, DragOperation::Move, 5.0);
        assert_eq!(commit.bounds.start_date(), d("2025-02-06"));

        let bar = fx.state.layout(&config, now()).bar(fx.deliverable).cloned().unwrap();
        assert_eq!(bar.source, BoundsSource::Optimistic);
        assert_eq!(bar.bounds, commit.bounds);
        assert!(bar.left > before);
        assert_eq!(fx.state.in_flight_count(), 1);
        assert_eq!(fx.state.poll(&fx.store), vec![]);
    }

    #[test]
    fn live_bounds_show_during_the_gesture_without_saving() {
        let mut fx = fixture();
        let window = fx.state.window(&TimelineConfig::default(), now().date_naive());
        fx.state.begin_drag(DragOperation::ResizeEnd, fx.phase, 50.0);
        for px in [55.0, 60.0, 70.0] {
            fx.state.update_drag(px, &window, TRACK_PX);
        }

        let bar = fx.state.layout(&TimelineConfig::default(), now()).bar(fx.phase).cloned().unwrap();
        assert_eq!(bar.source, BoundsSource::Live);
        assert_eq!(bar.bounds.end_date(), d("2025-04-20"));
        assert!(fx.store.saves.borrow().is_empty());
    }

    #[test]
    fn exactly_one_save_per_gesture() {
        let mut fx = fixture();
        let item = fx.phase;
        drag_by(&mut fx, item, DragOperation::ResizeStart, 40.0);
        assert_eq!(*fx.store.saves.borrow(), vec![fx.phase]);
        assert_eq!(fx.state.overlay().len(), 1);
        assert_eq!(
            fx.state.effective_bounds(fx.phase).map(|b| b.start_date()),
            Some(d("2025-03-30"))
        );
    }

    #[test]
    fn confirmation_refetches_and_clears_the_overlay() {
        let mut fx = fixture();
        let item = fx.phase;
        let revision = fx.state.revision();
        drag_by(&mut fx, item, DragOperation::Move, 10.0);

        fx.store.settle(0, Ok(()));
        let settled = fx.state.poll(&fx.store);
        assert_eq!(settled, vec![SettledSave { item: fx.phase, result: Ok(()) }]);
        assert!(fx.state.revision() > revision);
        assert!(fx.state.overlay().is_empty());

        let bar = fx.state.layout(&TimelineConfig::default(), now()).bar(fx.phase).cloned().unwrap();
        assert_eq!(bar.source, BoundsSource::Committed);
        assert_eq!(bar.bounds.start_date(), d("2025-03-11"));
    }

    #[test]
    fn failed_save_is_superseded_by_the_refetch() {
        let mut fx = fixture();
        let item = fx.deliverable;
        drag_by(&mut fx, item, DragOperation::Move, 10.0);

        fx.store.settle(0, Err(StoreError::Disconnected));
        let settled = fx.state.poll(&fx.store);
        assert!(settled[0].result.is_err());
        assert!(fx.state.overlay().is_empty());

        // ManualStore never applied the deliverable write.
        let bar = fx.state.layout(&TimelineConfig::default(), now()).bar(fx.deliverable).cloned().unwrap();
        assert_eq!(bar.bounds.start_date(), d("2025-02-01"));
    }

    #[test]
    fn refetch_waits_for_every_in_flight_save() {
        let mut fx = fixture();
        let (phase, deliverable) = (fx.phase, fx.deliverable);
        drag_by(&mut fx, phase, DragOperation::Move, 3.0);
        drag_by(&mut fx, deliverable, DragOperation::Move, 3.0);
        let revision = fx.state.revision();

        fx.store.settle(0, Ok(()));
        assert_eq!(fx.state.poll(&fx.store).len(), 1);
        assert_eq!(fx.state.revision(), revision);
        assert_eq!(fx.state.overlay().len(), 2);

        fx.store.settle(1, Ok(()));
        fx.state.poll(&fx.store);
        assert!(fx.state.revision() > revision);
        assert!(fx.state.overlay().is_empty());
    }

    #[test]
    fn next_drag_starts_from_optimistic_bounds() {
        let mut fx = fixture();
        let item = fx.phase;
        drag_by(&mut fx, item, DragOperation::Move, 10.0);
        let second = drag_by(&mut fx, item, DragOperation::Move, 10.0);
        assert_eq!(second.committed.start_date(), d("2025-03-11"));
        assert_eq!(second.bounds.start_date(), d("2025-03-21"));
    }

    #[test]
    fn milestones_cannot_be_dragged() {
        let mut fx = fixture();
        let milestone = ItemRef::Milestone(fx.state.project().milestones[0].id);
        assert!(!fx.state.begin_drag(DragOperation::Move, milestone, 0.0));
        assert_eq!(fx.state.release_drag(&fx.store), None);
    }
}
