//! Timeline settings: layout metrics and behaviour knobs, persisted as JSON in
//! the OS config directory.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Layout metrics for one workstream row (all in points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowMetrics {
    pub bar_height: f32,
    pub lane_gap: f32,
    /// Space above the first lane, used by the row label.
    pub header_offset: f32,
    pub padding: f32,
    pub min_height: f32,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            bar_height: 22.0,
            lane_gap: 4.0,
            header_offset: 18.0,
            padding: 8.0,
            min_height: 48.0,
        }
    }
}

impl RowMetrics {
    pub fn row_height(&self, lanes: usize) -> f32 {
        let stacked = self.header_offset + lanes as f32 * (self.bar_height + self.lane_gap) + self.padding;
        stacked.max(self.min_height)
    }

    /// Top of `lane`, relative to the top of its row.
    pub fn lane_top(&self, lane: usize) -> f32 {
        self.header_offset + lane as f32 * (self.bar_height + self.lane_gap)
    }
}

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub rows: RowMetrics,
    /// Visible gap kept between consecutive bars in one lane.
    pub lane_buffer_hours: i64,
    /// Fraction of the item span added on each side of a synthesized window.
    pub window_padding_ratio: f64,
    /// Simulated round trip of the in-memory store.
    pub store_latency_ms: u64,
    /// Width of the left column holding workstream names.
    pub label_width: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            rows: RowMetrics::default(),
            lane_buffer_hours: 12,
            window_padding_ratio: 0.05,
            store_latency_ms: 400,
            label_width: 160.0,
        }
    }
}

impl TimelineConfig {
    pub fn lane_buffer(&self) -> Duration {
        Duration::hours(self.lane_buffer_hours.max(0))
    }

    pub fn default_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "PortfolioTimeline") {
            Some(dirs) => dirs.config_dir().join("settings.json"),
            None => PathBuf::from("settings.json"),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("settings load failed, using defaults: {err}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_height_grows_with_lanes_above_the_floor() {
        let rows = RowMetrics::default();
        assert_eq!(rows.row_height(0), rows.min_height);
        assert_eq!(rows.row_height(1), 52.0);
        assert_eq!(rows.row_height(3), 18.0 + 3.0 * 26.0 + 8.0);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "lane_buffer_hours": 6, "rows": { "bar_height": 30.0 } }"#).unwrap();

        let config = TimelineConfig::load(&path).unwrap();
        assert_eq!(config.lane_buffer(), Duration::hours(6));
        assert_eq!(config.rows.bar_height, 30.0);
        assert_eq!(config.rows.lane_gap, RowMetrics::default().lane_gap);
        assert_eq!(config.window_padding_ratio, 0.05);
    }

    #[test]
    fn broken_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(TimelineConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(TimelineConfig::load_or_default(&path), TimelineConfig::default());
        assert_eq!(
            TimelineConfig::load_or_default(&dir.path().join("missing.json")),
            TimelineConfig::default()
        );
    }
}
