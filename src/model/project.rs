use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::{Deliverable, ItemRef, Milestone, Phase, Workstream};
use super::timeline::Bounds;

/// Project-level settings as the host stores them (ISO `YYYY-MM-DD` strings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub project_start_date: Option<String>,
    pub project_end_date: Option<String>,
}

impl ProjectConfig {
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            project_start_date: Some(start.format("%Y-%m-%d").to_string()),
            project_end_date: Some(end.format("%Y-%m-%d").to_string()),
        }
    }

    /// Both configured dates, if both are present and parse.
    pub fn configured_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = parse_iso(self.project_start_date.as_deref()?)?;
        let end = parse_iso(self.project_end_date.as_deref()?)?;
        Some((start, end))
    }
}

fn parse_iso(raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!("ignoring unparseable project date {raw:?}: {err}");
            None
        }
    }
}

/// The project aggregate the timeline renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub config: ProjectConfig,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub workstreams: Vec<Workstream>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn phase(&self, id: Uuid) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn milestone(&self, id: Uuid) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }

    pub fn deliverable(&self, milestone_id: Uuid, deliverable_id: Uuid) -> Option<&Deliverable> {
        self.milestone(milestone_id)?
            .deliverables
            .iter()
            .find(|d| d.id == deliverable_id)
    }

    pub fn workstream(&self, id: Uuid) -> Option<&Workstream> {
        self.workstreams.iter().find(|w| w.id == id)
    }

    /// Server-confirmed bounds of a draggable item.
    pub fn committed_bounds(&self, item: ItemRef) -> Option<Bounds> {
        match item {
            ItemRef::Phase(id) => self.phase(id)?.bounds(),
            ItemRef::Deliverable {
                milestone_id,
                deliverable_id,
            } => self.deliverable(milestone_id, deliverable_id)?.bounds(),
            ItemRef::Milestone(_) => None,
        }
    }

    /// Every date carried by any item, used to synthesize a window.
    pub fn all_dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        for phase in &self.phases {
            dates.extend(phase.start_date);
            dates.extend(phase.end_date);
        }
        for milestone in &self.milestones {
            dates.extend(milestone.date);
            for deliverable in &milestone.deliverables {
                dates.extend(deliverable.start_date);
                dates.extend(deliverable.end_date);
            }
        }
        dates
    }

    /// Replace a phase in place. Returns false when the id is unknown.
    pub fn replace_phase(&mut self, phase: Phase) -> bool {
        match self.phases.iter_mut().find(|p| p.id == phase.id) {
            Some(slot) => {
                *slot = phase;
                true
            }
            None => false,
        }
    }

    pub fn replace_deliverable(&mut self, milestone_id: Uuid, deliverable: Deliverable) -> bool {
        let Some(milestone) = self.milestones.iter_mut().find(|m| m.id == milestone_id) else {
            return false;
        };
        match milestone.deliverables.iter_mut().find(|d| d.id == deliverable.id) {
            Some(slot) => {
                *slot = deliverable;
                true
            }
            None => false,
        }
    }
}

/// An authoritative project collection as fetched from the store.
///
/// `revision` changes whenever the store hands out a new collection; it is
/// the identity the optimistic overlay is invalidated against.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub revision: u64,
    pub project: Arc<Project>,
}

impl ProjectSnapshot {
    pub fn new(revision: u64, project: Project) -> Self {
        Self {
            revision,
            project: Arc::new(project),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn configured_range_requires_both_dates() {
        let mut config = ProjectConfig::from_dates(d("2025-01-01"), d("2025-12-31"));
        assert_eq!(config.configured_range(), Some((d("2025-01-01"), d("2025-12-31"))));

        config.project_end_date = Some("31/12/2025".into());
        assert_eq!(config.configured_range(), None);

        config.project_end_date = None;
        assert_eq!(config.configured_range(), None);
    }

    #[test]
    fn replace_deliverable_targets_owning_milestone() {
        let mut project = Project::new("Portfolio");
        let mut milestone = Milestone::new("Beta", d("2025-03-01"));
        let deliverable = Deliverable::new("API", d("2025-02-01"), d("2025-02-20"));
        let deliverable_id = deliverable.id;
        milestone.deliverables.push(deliverable.clone());
        let milestone_id = milestone.id;
        project.milestones.push(milestone);

        let mut moved = deliverable;
        moved.end_date = Some(d("2025-02-25"));
        assert!(project.replace_deliverable(milestone_id, moved));
        assert_eq!(
            project.deliverable(milestone_id, deliverable_id).and_then(|d| d.end_date),
            Some(d("2025-02-25"))
        );
        assert!(!project.replace_deliverable(Uuid::new_v4(), Deliverable::new("x", d("2025-01-01"), d("2025-01-02"))));
    }

    #[test]
    fn milestones_have_no_draggable_bounds() {
        let mut project = Project::new("Portfolio");
        let milestone = Milestone::new("GA", d("2025-06-01"));
        let id = milestone.id;
        project.milestones.push(milestone);
        assert_eq!(project.committed_bounds(ItemRef::Milestone(id)), None);
    }
}
