//! Pointer-drag state machine for moving and resizing phase/deliverable bars.
//!
//! A session exists only between pointer-down and pointer-up. While it is
//! live, every pointer move recomputes `live` from the untouched `committed`
//! bounds; release hands back a [`DragCommit`] and returns to idle. Nothing in
//! here talks to the store, so no network call can happen mid-gesture.

use chrono::Duration;

use crate::model::timeline::MIN_SPAN_MS;
use crate::model::{Bounds, ItemRef, TimelineWindow};

/// What the gesture does to the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOperation {
    Move,
    ResizeStart,
    ResizeEnd,
}

/// An in-progress gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub operation: DragOperation,
    pub target: ItemRef,
    pub anchor_pointer_x: f32,
    /// Bounds at pointer-down. Never mutated mid-gesture.
    pub committed: Bounds,
    pub live: Bounds,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Final bounds of a released gesture, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragCommit {
    pub operation: DragOperation,
    pub target: ItemRef,
    pub committed: Bounds,
    pub bounds: Bounds,
}

impl DragCommit {
    pub fn is_noop(&self) -> bool {
        self.bounds.start_date() == self.committed.start_date()
            && self.bounds.end_date() == self.committed.end_date()
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    /// Live bounds for `item` if it is the one being dragged.
    pub fn live_bounds(&self, item: ItemRef) -> Option<Bounds> {
        self.session()
            .filter(|session| session.target == item)
            .map(|session| session.live)
    }

    /// Pointer-down on a drag handle.
    ///
    /// Items without both dates are not draggable (`bounds` is `None`) and
    /// milestones never are. A second pointer-down while a session is live is
    /// ignored: the first gesture keeps ownership until release.
    pub fn begin(
        &mut self,
        operation: DragOperation,
        target: ItemRef,
        pointer_x: f32,
        bounds: Option<Bounds>,
    ) -> bool {
        if let DragState::Dragging(active) = &self.state {
            tracing::debug!(active = ?active.target, ignored = ?target, "drag already in progress");
            return false;
        }
        if matches!(target, ItemRef::Milestone(_)) {
            return false;
        }
        let Some(committed) = bounds else {
            return false;
        };

        tracing::debug!(?operation, item = ?target, pointer_x, "drag started");
        self.state = DragState::Dragging(DragSession {
            operation,
            target,
            anchor_pointer_x: pointer_x,
            committed,
            live: committed,
        });
        true
    }

    /// Pointer-move: recompute live bounds from the pixel delta since
    /// pointer-down. Returns the new live bounds, or `None` when idle.
    pub fn update(
        &mut self,
        pointer_x: f32,
        window: &TimelineWindow,
        track_width_px: f32,
    ) -> Option<Bounds> {
        let DragState::Dragging(session) = &mut self.state else {
            return None;
        };

        let pixel_delta = (pointer_x - session.anchor_pointer_x) as f64;
        let ms_per_pixel = window.duration_ms() / track_width_px.max(1.0) as f64;
        let delta = Duration::milliseconds((pixel_delta * ms_per_pixel).round() as i64);

        session.live = apply_delta(session.operation, session.committed, delta);
        Some(session.live)
    }

    /// Pointer-up: always commits whatever the live bounds hold.
    pub fn release(&mut self) -> Option<DragCommit> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => {
                let commit = DragCommit {
                    operation: session.operation,
                    target: session.target,
                    committed: session.committed,
                    bounds: snap_to_days(session.live),
                };
                tracing::debug!(
                    item = ?commit.target,
                    start = %commit.bounds.start_date(),
                    end = %commit.bounds.end_date(),
                    "drag released"
                );
                Some(commit)
            }
            DragState::Idle => None,
        }
    }
}

/// Live bounds for a pointer offset of `delta` from the anchor.
pub fn apply_delta(operation: DragOperation, committed: Bounds, delta: Duration) -> Bounds {
    let min_span = Duration::milliseconds(MIN_SPAN_MS);
    match operation {
        DragOperation::Move => committed.shifted(delta),
        DragOperation::ResizeStart => {
            let start = (committed.start + delta).min(committed.end - min_span);
            Bounds::new(start, committed.end)
        }
        DragOperation::ResizeEnd => {
            let end = (committed.end + delta).max(committed.start + min_span);
            Bounds::new(committed.start, end)
        }
    }
}

/// Round both edges to calendar days, as they will be persisted.
fn snap_to_days(bounds: Bounds) -> Bounds {
    Bounds::from_dates(bounds.start_date(), bounds.end_date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn year_window() -> TimelineWindow {
        // 364 days over 364 px: one day per pixel.
        TimelineWindow::from_dates(d("2025-01-01"), d("2025-12-31"))
    }

    const TRACK_PX: f32 = 364.0;

    fn march_phase() -> (ItemRef, Bounds) {
        (
            ItemRef::Phase(Uuid::new_v4()),
            Bounds::from_dates(d("2025-03-01"), d("2025-03-31")),
        )
    }

    #[test]
    fn resize_start_past_the_end_clamps_to_one_day() {
        let (target, bounds) = march_phase();
        let mut drag = DragController::new();
        assert!(drag.begin(DragOperation::ResizeStart, target, 100.0, Some(bounds)));

        drag.update(140.0, &year_window(), TRACK_PX);
        let commit = drag.release().unwrap();
        assert_eq!(commit.bounds.start_date(), d("2025-03-30"));
        assert_eq!(commit.bounds.end_date(), d("2025-03-31"));
        assert_eq!(commit.bounds.duration(), Duration::days(1));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn resize_start_backwards_extends_the_bar() {
        let (target, bounds) = march_phase();
        let mut drag = DragController::new();
        drag.begin(DragOperation::ResizeStart, target, 100.0, Some(bounds));
        drag.update(60.0, &year_window(), TRACK_PX);
        let commit = drag.release().unwrap();
        assert_eq!(commit.bounds.start_date(), d("2025-01-20"));
        assert_eq!(commit.bounds.end_date(), d("2025-03-31"));
    }

    #[test]
    fn resize_end_before_the_start_clamps_to_one_day() {
        let (target, bounds) = march_phase();
        let mut drag = DragController::new();
        drag.begin(DragOperation::ResizeEnd, target, 200.0, Some(bounds));
        drag.update(0.0, &year_window(), TRACK_PX);
        let commit = drag.release().unwrap();
        assert_eq!(commit.bounds.start_date(), d("2025-03-01"));
        assert_eq!(commit.bounds.end_date(), d("2025-03-02"));
    }

    #[test]
    fn move_shifts_both_edges_and_rounds_to_days() {
        let (target, bounds) = march_phase();
        let mut drag = DragController::new();
        drag.begin(DragOperation::Move, target, 10.0, Some(bounds));

        let live = drag.update(17.4, &year_window(), TRACK_PX).unwrap();
        assert_eq!(live.duration(), bounds.duration());
        assert_eq!(drag.live_bounds(target), Some(live));

        let commit = drag.release().unwrap();
        assert_eq!(commit.bounds.start_date(), d("2025-03-08"));
        assert_eq!(commit.bounds.end_date(), d("2025-04-07"));
        assert_eq!(commit.committed, bounds);
    }

    #[test]
    fn items_without_dates_and_milestones_are_not_draggable() {
        let mut drag = DragController::new();
        assert!(!drag.begin(DragOperation::Move, ItemRef::Phase(Uuid::new_v4()), 0.0, None));
        let bounds = Some(Bounds::from_dates(d("2025-01-01"), d("2025-01-02")));
        assert!(!drag.begin(DragOperation::Move, ItemRef::Milestone(Uuid::new_v4()), 0.0, bounds));
        assert_eq!(drag.state(), &DragState::Idle);
        assert_eq!(drag.release(), None);
    }

    #[test]
    fn second_pointer_down_is_ignored_while_dragging() {
        let (first, bounds) = march_phase();
        let (second, _) = march_phase();
        let mut drag = DragController::new();
        assert!(drag.begin(DragOperation::Move, first, 0.0, Some(bounds)));
        assert!(!drag.begin(DragOperation::ResizeEnd, second, 50.0, Some(bounds)));
        assert_eq!(drag.session().map(|s| s.target), Some(first));
    }

    #[test]
    fn update_while_idle_does_nothing() {
        let mut drag = DragController::new();
        assert_eq!(drag.update(10.0, &year_window(), TRACK_PX), None);
    }

    #[test]
    fn release_without_movement_is_a_noop_commit() {
        let (target, bounds) = march_phase();
        let mut drag = DragController::new();
        drag.begin(DragOperation::Move, target, 42.0, Some(bounds));
        drag.update(42.2, &year_window(), TRACK_PX);
        assert!(drag.release().unwrap().is_noop());
    }

    proptest! {
        #[test]
        fn resize_never_drops_below_one_day(
            px in -5_000.0_f32..5_000.0,
            len in 0_i64..200,
            resize_end in any::<bool>(),
        ) {
            let start = d("2025-02-01");
            let bounds = Bounds::from_dates(start, start + Duration::days(len));
            let operation = if resize_end { DragOperation::ResizeEnd } else { DragOperation::ResizeStart };

            let mut drag = DragController::new();
            drag.begin(operation, ItemRef::Phase(Uuid::nil()), 0.0, Some(bounds));
            let live = drag.update(px, &year_window(), TRACK_PX).unwrap();
            prop_assert!(live.duration() >= Duration::days(1));

            let commit = drag.release().unwrap();
            prop_assert!(commit.bounds.duration() >= Duration::days(1));
        }

        #[test]
        fn move_preserves_duration(px in -5_000.0_f32..5_000.0, len in 0_i64..200) {
            let start = d("2025-02-01");
            let bounds = Bounds::from_dates(start, start + Duration::days(len));

            let mut drag = DragController::new();
            drag.begin(DragOperation::Move, ItemRef::Phase(Uuid::nil()), 0.0, Some(bounds));
            let live = drag.update(px, &year_window(), TRACK_PX).unwrap();
            prop_assert_eq!(live.duration(), bounds.duration());
            prop_assert_eq!(drag.release().unwrap().bounds.duration(), bounds.duration());
        }
    }
}
