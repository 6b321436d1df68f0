use std::path::Path;

use crate::error::ProjectFileError;
use crate::model::Project;

/// Save a project to a JSON file.
pub fn save_project(project: &Project, path: &Path) -> Result<(), ProjectFileError> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json).map_err(|source| ProjectFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a project from a JSON file.
pub fn load_project(path: &Path) -> Result<Project, ProjectFileError> {
    let json = std::fs::read_to_string(path).map_err(|source| ProjectFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ProjectFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
