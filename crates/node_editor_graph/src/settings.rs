// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor behavior settings, stored as RON.

use crate::viewport::{DEFAULT_ZOOM_STEP, MIN_ZOOM};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// A setting is out of range
    #[error("Invalid setting {name}: {value}")]
    Invalid {
        /// Setting name
        name: &'static str,
        /// Rejected value
        value: f64,
    },
}

/// Editor behavior settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Reject connections that would close a directed cycle
    pub prevent_circular_connections: bool,
    /// Zoom change per wheel notch
    pub zoom_step: f64,
    /// Smallest allowed zoom factor
    pub min_zoom: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            prevent_circular_connections: true,
            zoom_step: DEFAULT_ZOOM_STEP,
            min_zoom: MIN_ZOOM,
        }
    }
}

impl EditorSettings {
    /// Check value ranges.
    ///
    /// `zoom_step` must be finite and positive; `min_zoom` must be finite
    /// and at least [`MIN_ZOOM`].
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 {
            return Err(SettingsError::Invalid {
                name: "zoom_step",
                value: self.zoom_step,
            });
        }
        if !self.min_zoom.is_finite() || self.min_zoom < MIN_ZOOM {
            return Err(SettingsError::Invalid {
                name: "min_zoom",
                value: self.min_zoom,
            });
        }
        Ok(())
    }

    /// Lowest zoom factor the viewport may reach
    pub fn zoom_floor(&self) -> f64 {
        self.min_zoom.max(MIN_ZOOM)
    }

    /// Parse and validate settings from a RON string
    pub fn from_ron(source: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content)?;
        tracing::debug!("Loaded editor settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}
