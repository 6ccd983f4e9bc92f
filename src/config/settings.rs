//! Orchestrator settings and the TOML configuration file.

use super::{CameraConfiguration, DEFAULT_LOG_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown configuration field: {0}")]
    UnknownField(String),
    #[error("invalid color (expected #RRGGBB or #RRGGBBAA): {0}")]
    InvalidColor(String),
    #[error("invalid zoom: {0}")]
    InvalidZoom(String),
    #[error("invalid shutter fade duration (must be 1-5000 ms)")]
    InvalidShutterFade,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Tunables of the orchestrator itself, as opposed to host properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Fade-in duration of the shutter effect in milliseconds.
    pub shutter_fade_ms: u64,
    /// Deliveries retained in the applied-diff log.
    pub diff_log_capacity: usize,
    /// Root directory for captured images. Defaults to the user cache dir.
    pub cache_dir: Option<PathBuf>,
    /// Application identifier used to scope the capture directory.
    pub bundle_id: Option<String>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            shutter_fade_ms: 350,
            diff_log_capacity: DEFAULT_LOG_CAPACITY,
            cache_dir: None,
            bundle_id: None,
        }
    }
}

impl OrchestratorSettings {
    pub fn shutter_fade(&self) -> Duration {
        Duration::from_millis(self.shutter_fade_ms)
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shutter_fade_ms == 0 || self.shutter_fade_ms > 5000 {
            return Err(ConfigError::InvalidShutterFade);
        }
        Ok(())
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Initial property values, delivered as the first update.
    #[serde(default)]
    pub camera: CameraConfiguration,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.camera.validate()?;
        config.orchestrator.validate()?;
        Ok(config)
    }
}
