use std::path::PathBuf;

use uuid::Uuid;

/// Failures reported by a [`TimelineStore`](crate::store::TimelineStore).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("phase not found: {0}")]
    PhaseNotFound(Uuid),
    #[error("deliverable {deliverable_id} not found under milestone {milestone_id}")]
    DeliverableNotFound { milestone_id: Uuid, deliverable_id: Uuid },
    #[error("end date {end} is before start date {start}")]
    InvertedDates { start: String, end: String },
    #[error("store worker is no longer running")]
    Disconnected,
}

#[derive(thiserror::Error, Debug)]
pub enum ProjectFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid project file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode project: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
