//! Replay configuration
//!
//! Settings can be loaded from a RON file. Every field falls back to its
//! default, so a config file only needs the keys it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::LengthUnit;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Unit of the JSON coordinates
    pub units: LengthUnit,
    /// Tolerance (degrees) for the 180° X rotation that flips the extrusion
    pub flip_tolerance_deg: f64,
    /// Translations at or below this length (cm) are not applied
    pub move_epsilon: f64,
    /// Chord tolerance (cm) used when tessellating for export
    pub tessellation_tolerance: f32,
    /// Distance (cm) under which circles count as touching or coincident
    pub tangency_tolerance: f32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            units: LengthUnit::Meters,
            flip_tolerance_deg: 1e-6,
            move_epsilon: 1e-9,
            tessellation_tolerance: 0.01,
            tangency_tolerance: 1e-5,
        }
    }
}

impl ReplayConfig {
    /// Unit multiplier from source units to kernel centimeters
    pub fn unit_scale(&self) -> f64 {
        self.units.scale_to_kernel()
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Parse from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Save to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}
