//! Capture outcome types returned to the host.

use super::StorageError;
use crate::hardware::HardwareError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload handed to the host after a successful capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Size of the persisted image in bytes.
    pub size: usize,
    /// `file://` URI of the persisted image.
    pub uri: String,
    /// File name, always ending in `.jpg`.
    pub name: String,
    /// Thumbnail URI. Thumbnails are not persisted, so this is always empty.
    pub thumb: String,
}

/// Errors surfaced through a capture's error callback.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera is not available: {0}")]
    HardwareUnavailable(#[source] HardwareError),
    #[error("{0}")]
    CaptureFailed(String),
    #[error("Error occurred while writing image data to a temporary file: {0}")]
    FileWriteFailed(#[from] StorageError),
}

impl CaptureError {
    /// Human-readable message for the host.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<HardwareError> for CaptureError {
    fn from(err: HardwareError) -> Self {
        match err {
            HardwareError::CaptureRejected(reason) => CaptureError::CaptureFailed(reason),
            other => CaptureError::HardwareUnavailable(other),
        }
    }
}
