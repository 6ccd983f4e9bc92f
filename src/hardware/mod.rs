//! Camera hardware contract.
//!
//! This module describes what the orchestrator needs from the device layer
//! (session lifecycle, imperative setters, async still capture) and ships a
//! recording mock. Real drivers live outside this crate.

mod mock;
mod session;
mod types;

pub use mock::{CaptureBehavior, HardwareCall, MockCameraSession, SetupHook};
pub use session::{
    BarcodeListener, CameraSession, CaptureEvent, CaptureListener, HardwareError,
    OrientationListener, ZoomListener,
};
pub use types::{
    BarcodeType, CameraFacing, Dimensions, FlashMode, FocusMode, FrameRect, Orientation,
    RequestId, TorchMode, ZoomMode,
};
