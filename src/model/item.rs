use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timeline::Bounds;

/// Discriminates the three kinds of timed item on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Phase,
    Milestone,
    Deliverable,
}

/// Stable identity of a timed item, including the owning milestone for
/// deliverables (needed to address the save call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Phase(Uuid),
    Milestone(Uuid),
    Deliverable { milestone_id: Uuid, deliverable_id: Uuid },
}

impl ItemRef {
    pub fn id(&self) -> Uuid {
        match *self {
            ItemRef::Phase(id) | ItemRef::Milestone(id) => id,
            ItemRef::Deliverable { deliverable_id, .. } => deliverable_id,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemRef::Phase(_) => ItemKind::Phase,
            ItemRef::Milestone(_) => ItemKind::Milestone,
            ItemRef::Deliverable { .. } => ItemKind::Deliverable,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    #[default]
    NotStarted,
    InProgress,
    AtRisk,
    Completed,
}

/// A project phase: a date span, optionally grouped into a workstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub workstream_id: Option<Uuid>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub owner: Option<String>,
}

impl Phase {
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date: Some(start),
            end_date: Some(end),
            workstream_id: None,
            status: ItemStatus::default(),
            owner: None,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        span_bounds(self.start_date, self.end_date)
    }

    /// Copy of this phase carrying the given dates.
    pub fn with_bounds(&self, bounds: Bounds) -> Self {
        Self {
            start_date: Some(bounds.start_date()),
            end_date: Some(bounds.end_date()),
            ..self.clone()
        }
    }
}

/// A deliverable, owned by a milestone but laid out in its own workstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub workstream_id: Option<Uuid>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub owner: Option<String>,
}

impl Deliverable {
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date: Some(start),
            end_date: Some(end),
            workstream_id: None,
            status: ItemStatus::default(),
            owner: None,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        span_bounds(self.start_date, self.end_date)
    }

    pub fn with_bounds(&self, bounds: Bounds) -> Self {
        Self {
            start_date: Some(bounds.start_date()),
            end_date: Some(bounds.end_date()),
            ..self.clone()
        }
    }
}

/// An instantaneous event. Milestones are clicked, never dragged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub workstream_id: Option<Uuid>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
}

impl Milestone {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            date: Some(date),
            workstream_id: None,
            status: ItemStatus::default(),
            owner: None,
            deliverables: Vec::new(),
        }
    }
}

/// A named swimlane. Items point at it by id; it owns nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workstream {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub color_hint: Option<String>,
}

impl Workstream {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color_hint: None,
        }
    }
}

fn span_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Bounds> {
    match (start, end) {
        (Some(start), Some(end)) => Some(Bounds::from_dates(start, end)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn items_without_both_dates_have_no_bounds() {
        let mut phase = Phase::new("Design", d("2025-03-01"), d("2025-03-31"));
        assert!(phase.bounds().is_some());
        phase.end_date = None;
        assert_eq!(phase.bounds(), None);
    }

    #[test]
    fn with_bounds_keeps_identity_and_metadata() {
        let mut deliverable = Deliverable::new("Spec", d("2025-02-01"), d("2025-02-10"));
        deliverable.owner = Some("ops".into());
        let moved = deliverable.with_bounds(Bounds::from_dates(d("2025-02-03"), d("2025-02-12")));

        assert_eq!(moved.id, deliverable.id);
        assert_eq!(moved.owner.as_deref(), Some("ops"));
        assert_eq!(moved.start_date, Some(d("2025-02-03")));
        assert_eq!(moved.end_date, Some(d("2025-02-12")));
    }

    #[test]
    fn serializes_with_host_field_names() {
        let phase = Phase::new("Build", d("2025-04-01"), d("2025-05-15"));
        let json = serde_json::to_value(&phase).unwrap();
        assert_eq!(json["startDate"], "2025-04-01");
        assert_eq!(json["endDate"], "2025-05-15");
        assert_eq!(json["status"], "not-started");
        assert!(json["workstreamId"].is_null());
    }
}
