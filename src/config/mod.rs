//! Component configuration.
//!
//! The host delivers a full property snapshot together with the names of
//! the properties that changed. This module holds the snapshot types, the
//! delivery buffer and the settings file the demo binary reads.

mod buffer;
mod camera;
mod fields;
mod settings;

pub use buffer::{AppliedDiff, ConfigurationBuffer, Delivery, DEFAULT_LOG_CAPACITY};
pub use camera::CameraConfiguration;
pub use fields::{ChangedFields, Color, ConfigField};
pub use settings::{ConfigError, FileConfig, OrchestratorSettings};
