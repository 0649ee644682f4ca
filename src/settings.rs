//! Settings management for Hand AR
//!
//! Settings live in a single JSON file. Every section has defaults, so a
//! partial file (or none at all) is fine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::SceneConfig;
use crate::telemetry::LogConfig;
use crate::tracker::TrackerConfig;

/// Errors loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tracker: TrackerConfig,
    pub scene: SceneConfig,
    pub logging: LogConfig,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults if the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings from {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        log::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let threshold = self.tracker.gesture.pinch_threshold;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(SettingsError::Invalid {
                field: "tracker.gesture.pinch_threshold",
                reason: format!("must be a positive number, got {}", threshold),
            });
        }
        if self.tracker.gesture.stale_pinch_frames == Some(0) {
            return Err(SettingsError::Invalid {
                field: "tracker.gesture.stale_pinch_frames",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        if self.tracker.channel_capacity == 0 {
            return Err(SettingsError::Invalid {
                field: "tracker.channel_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        let retry = &self.tracker.retry;
        if !(retry.factor.is_finite() && retry.factor >= 1.0) {
            return Err(SettingsError::Invalid {
                field: "tracker.retry.factor",
                reason: format!("must be at least 1.0, got {}", retry.factor),
            });
        }
        Ok(())
    }
}
