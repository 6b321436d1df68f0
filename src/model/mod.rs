pub mod item;
pub mod lanes;
pub mod project;
pub mod timeline;

pub use item::{Deliverable, ItemKind, ItemRef, ItemStatus, Milestone, Phase, Workstream};
pub use lanes::assign_lanes;
pub use project::{Project, ProjectConfig, ProjectSnapshot};
pub use timeline::{Bounds, MonthMarker, TimelineWindow};
