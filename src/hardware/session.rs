//! Capability contract for the physical camera session.
//!
//! The orchestrator never talks to a video pipeline directly. It drives an
//! implementation of [`CameraSession`], which owns the device, the preview
//! surface and the still-capture pipeline.

use super::types::{
    BarcodeType, CameraFacing, Dimensions, FlashMode, FrameRect, Orientation, RequestId,
    TorchMode,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a camera session.
#[derive(Debug, Clone, Error)]
pub enum HardwareError {
    #[error("no camera device available")]
    Unavailable,
    #[error("failed to set up camera session: {0}")]
    SetupFailed(String),
    #[error("camera session not set up")]
    NotInitialized,
    #[error("capture request rejected: {0}")]
    CaptureRejected(String),
}

/// Progress of a single still-capture request.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// The shutter is about to fire.
    WillCapture,
    /// Terminal: the image was produced.
    Succeeded {
        image: Vec<u8>,
        thumbnail: Option<Vec<u8>>,
        dimensions: Dimensions,
    },
    /// Terminal: the capture failed.
    Failed { message: String },
}

impl CaptureEvent {
    /// Returns true for events that end a request's lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CaptureEvent::WillCapture)
    }
}

/// Receives capture progress, correlated by request id.
pub type CaptureListener = Arc<dyn Fn(RequestId, CaptureEvent) + Send + Sync>;

/// Receives decoded barcode payloads.
pub type BarcodeListener = Arc<dyn Fn(String) + Send + Sync>;

/// Receives device orientation changes.
pub type OrientationListener = Arc<dyn Fn(Orientation) + Send + Sync>;

/// Receives zoom factor changes.
pub type ZoomListener = Arc<dyn Fn(f64) + Send + Sync>;

/// Trait for camera session implementations.
///
/// Every setter may be called before [`CameraSession::setup`]; an
/// implementation must retain those values and apply them once the session
/// exists. All methods take `&self` because hardware callbacks arrive on
/// worker threads while the orchestrator keeps issuing updates.
pub trait CameraSession: Send + Sync {
    /// Builds the capture session. Called at most once per orchestrator.
    fn setup(&self, facing: CameraFacing, barcode_types: &[BarcodeType])
        -> Result<(), HardwareError>;

    /// Stops the session and releases the device.
    fn teardown(&self);

    fn update_facing(&self, facing: CameraFacing);

    fn update_flash(&self, mode: FlashMode);

    fn update_torch(&self, mode: TorchMode);

    fn update_zoom(&self, zoom: Option<f64>);

    fn update_max_zoom(&self, max_zoom: Option<f64>);

    /// Restricts barcode recognition to a region, or to the whole preview
    /// when `None`.
    fn update_scanner_frame(&self, frame: Option<FrameRect>);

    fn set_orientation_listener(&self, listener: Option<OrientationListener>);

    fn set_zoom_listener(&self, listener: Option<ZoomListener>);

    /// Enables or disables barcode recognition.
    fn set_barcode_scanning(
        &self,
        enabled: bool,
        types: &[BarcodeType],
        listener: Option<BarcodeListener>,
    );

    /// Issues a still capture.
    ///
    /// Returns the request id that every subsequent [`CaptureEvent`] for
    /// this request carries. At most one `WillCapture` and exactly one
    /// terminal event follow; they may be delivered on any thread, even
    /// before this method returns.
    fn capture_picture(&self, listener: CaptureListener) -> Result<RequestId, HardwareError>;

    fn pinch_start(&self);

    fn pinch_change(&self, scale: f64);
}
