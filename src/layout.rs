//! Render model for the swimlane view: which bar goes in which row and lane,
//! at what percentage, and how tall each row is. Pure, rebuilt every frame.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::TimelineConfig;
use crate::model::timeline::to_timestamp;
use crate::model::{assign_lanes, Bounds, ItemRef, MonthMarker, Project, TimelineWindow};

/// Where a bar's bounds came from this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsSource {
    Committed,
    Optimistic,
    Live,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    pub item: ItemRef,
    pub label: String,
    pub bounds: Bounds,
    pub source: BoundsSource,
    /// Percent positions, unclipped.
    pub left: f64,
    pub right: f64,
    pub lane: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneMarker {
    pub item: ItemRef,
    pub label: String,
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Phases,
    Workstream(Uuid),
    Unassigned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub kind: RowKind,
    pub title: String,
    pub color_hint: Option<String>,
    pub bars: Vec<BarLayout>,
    pub milestones: Vec<MilestoneMarker>,
    pub lane_count: usize,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout {
    pub window: TimelineWindow,
    pub months: Vec<MonthMarker>,
    pub today: Option<f64>,
    pub rows: Vec<RowLayout>,
}

impl TimelineLayout {
    pub fn total_height(&self) -> f32 {
        self.rows.iter().map(|row| row.height).sum()
    }

    pub fn bar(&self, item: ItemRef) -> Option<&BarLayout> {
        self.rows
            .iter()
            .flat_map(|row| row.bars.iter())
            .find(|bar| bar.item == item)
    }
}

/// Bounds to draw for an item, given its committed bounds.
pub trait BoundsResolver {
    fn resolve(&self, item: ItemRef, committed: Bounds) -> (Bounds, BoundsSource);
}

struct RowItems {
    kind: RowKind,
    title: String,
    color_hint: Option<String>,
    spans: Vec<(ItemRef, String, Bounds, BoundsSource)>,
    milestones: Vec<MilestoneMarker>,
}

impl RowItems {
    fn new(kind: RowKind, title: impl Into<String>, color_hint: Option<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            color_hint,
            spans: Vec::new(),
            milestones: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.milestones.is_empty()
    }

    fn into_row(self, window: &TimelineWindow, config: &TimelineConfig) -> RowLayout {
        let keyed: Vec<(ItemRef, Bounds)> = self.spans.iter().map(|(item, _, b, _)| (*item, *b)).collect();
        let lanes = assign_lanes(&keyed, config.lane_buffer());

        let bars = self
            .spans
            .into_iter()
            .map(|(item, label, bounds, source)| BarLayout {
                item,
                label,
                bounds,
                source,
                left: window.position_of(bounds.start),
                right: window.position_of(bounds.end),
                lane: lanes.lane_of(&item).unwrap_or(0),
            })
            .collect();

        RowLayout {
            kind: self.kind,
            title: self.title,
            color_hint: self.color_hint,
            bars,
            milestones: self.milestones,
            lane_count: lanes.lane_count,
            height: config.rows.row_height(lanes.lane_count),
        }
    }
}

/// Build the full layout: a phase band, one row per workstream, and an
/// "Unassigned" row for items whose workstream is unset or unknown.
/// Items missing either date get no bar.
pub fn build_layout(
    project: &Project,
    window: TimelineWindow,
    resolver: &impl BoundsResolver,
    config: &TimelineConfig,
    now: DateTime<Utc>,
) -> TimelineLayout {
    let mut phases = RowItems::new(RowKind::Phases, "Phases", None);
    for phase in &project.phases {
        if let Some(committed) = phase.bounds() {
            let item = ItemRef::Phase(phase.id);
            let (bounds, source) = resolver.resolve(item, committed);
            phases.spans.push((item, phase.name.clone(), bounds, source));
        }
    }

    let mut streams: Vec<RowItems> = project
        .workstreams
        .iter()
        .map(|ws| RowItems::new(RowKind::Workstream(ws.id), ws.name.clone(), ws.color_hint.clone()))
        .collect();
    let mut unassigned = RowItems::new(RowKind::Unassigned, "Unassigned", None);

    let row_for = |workstream_id: Option<Uuid>| -> usize {
        workstream_id
            .and_then(|id| streams.iter().position(|row| row.kind == RowKind::Workstream(id)))
            .unwrap_or(usize::MAX)
    };

    let mut placements: Vec<(usize, Placement)> = Vec::new();
    for milestone in &project.milestones {
        if let Some(date) = milestone.date {
            let marker = MilestoneMarker {
                item: ItemRef::Milestone(milestone.id),
                label: milestone.name.clone(),
                position: window.position_of(to_timestamp(date)),
            };
            placements.push((row_for(milestone.workstream_id), Placement::Marker(marker)));
        }
        for deliverable in &milestone.deliverables {
            let Some(committed) = deliverable.bounds() else {
                continue;
            };
            let item = ItemRef::Deliverable {
                milestone_id: milestone.id,
                deliverable_id: deliverable.id,
            };
            let (bounds, source) = resolver.resolve(item, committed);
            placements.push((
                row_for(deliverable.workstream_id),
                Placement::Span(item, deliverable.name.clone(), bounds, source),
            ));
        }
    }

    for (row, placement) in placements {
        let target = streams.get_mut(row).unwrap_or(&mut unassigned);
        match placement {
            Placement::Marker(marker) => target.milestones.push(marker),
            Placement::Span(item, label, bounds, source) => target.spans.push((item, label, bounds, source)),
        }
    }

    let mut rows = vec![phases.into_row(&window, config)];
    rows.extend(streams.into_iter().map(|row| row.into_row(&window, config)));
    if !unassigned.is_empty() {
        rows.push(unassigned.into_row(&window, config));
    }

    TimelineLayout {
        window,
        months: window.month_markers(),
        today: window.today_position_at(now),
        rows,
    }
}

enum Placement {
    Marker(MilestoneMarker),
    Span(ItemRef, String, Bounds, BoundsSource),
}
