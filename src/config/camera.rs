//! Declarative camera configuration.

use super::{Color, ConfigError};
use crate::hardware::{CameraFacing, FlashMode, FocusMode, TorchMode, ZoomMode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Full snapshot of the component's properties.
///
/// Host callbacks (`onReadCode`, `onOrientationChange`, `onZoom`) are
/// represented by whether a listener is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfiguration {
    pub camera_type: CameraFacing,
    pub flash_mode: FlashMode,
    pub torch_mode: TorchMode,
    /// Aspect ratio overlay such as `"16:9"`.
    pub ratio_overlay: Option<String>,
    pub ratio_overlay_color: Option<Color>,
    pub scan_barcode: bool,
    pub show_frame: bool,
    pub on_read_code: bool,
    /// Minimum milliseconds between forwarded barcode reads.
    pub scan_throttle_delay: u64,
    pub frame_color: Option<Color>,
    pub laser_color: Option<Color>,
    pub on_orientation_change: bool,
    pub on_zoom: bool,
    /// Milliseconds before a focus lock resets; 0 disables the timeout.
    pub reset_focus_timeout: u64,
    pub reset_focus_when_motion_detected: bool,
    pub focus_mode: FocusMode,
    pub zoom_mode: ZoomMode,
    pub zoom: Option<f64>,
    pub max_zoom: Option<f64>,
}

impl Default for CameraConfiguration {
    fn default() -> Self {
        Self {
            camera_type: CameraFacing::Back,
            flash_mode: FlashMode::Auto,
            torch_mode: TorchMode::Off,
            ratio_overlay: None,
            ratio_overlay_color: None,
            scan_barcode: false,
            show_frame: false,
            on_read_code: false,
            scan_throttle_delay: 2000,
            frame_color: None,
            laser_color: None,
            on_orientation_change: false,
            on_zoom: false,
            reset_focus_timeout: 0,
            reset_focus_when_motion_detected: false,
            focus_mode: FocusMode::On,
            zoom_mode: ZoomMode::On,
            zoom: None,
            max_zoom: None,
        }
    }
}

impl CameraConfiguration {
    /// Throttle interval for barcode reads.
    pub fn scan_throttle(&self) -> Duration {
        Duration::from_millis(self.scan_throttle_delay)
    }

    /// Focus reset timeout, if enabled.
    pub fn focus_reset_timeout(&self) -> Option<Duration> {
        (self.reset_focus_timeout > 0).then(|| Duration::from_millis(self.reset_focus_timeout))
    }

    /// True when decoded barcodes have somewhere to go.
    pub fn wants_barcodes(&self) -> bool {
        self.scan_barcode && self.on_read_code
    }

    /// Validates the numeric fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("zoom", self.zoom), ("maxZoom", self.max_zoom)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ConfigError::InvalidZoom(format!("{name} must be positive, got {v}")));
                }
            }
        }
        if let (Some(zoom), Some(max)) = (self.zoom, self.max_zoom) {
            if zoom > max {
                return Err(ConfigError::InvalidZoom(format!(
                    "zoom {zoom} exceeds maxZoom {max}"
                )));
            }
        }
        Ok(())
    }
}
