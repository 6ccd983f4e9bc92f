//! Camera lifecycle orchestration.
//!
//! The [`CameraOrchestrator`] builds the hardware session once both camera
//! permission and the first configuration delivery are in, then maps each
//! later delivery onto targeted hardware calls through the rule table in
//! [`RULES`]. Captures, barcode reads and pinch gestures are routed
//! through it as well.
//!
//! # Example
//!
//! ```no_run
//! use camera_kit::config::{CameraConfiguration, ChangedFields};
//! use camera_kit::hardware::MockCameraSession;
//! use camera_kit::orchestrator::{CameraOrchestrator, RecordingEventSink};
//! use camera_kit::permission::StaticPermission;
//! use std::sync::Arc;
//!
//! let orchestrator = CameraOrchestrator::builder(
//!     Arc::new(MockCameraSession::new()),
//!     Arc::new(StaticPermission::granted()),
//!     Arc::new(RecordingEventSink::new()),
//! )
//! .build()
//! .expect("Failed to resolve capture directory");
//!
//! orchestrator.apply_update(&ChangedFields::all(), CameraConfiguration::default());
//! orchestrator.capture(
//!     |result| println!("saved {}", result.uri),
//!     |err| eprintln!("capture failed: {err}"),
//! );
//! ```

mod camera;
mod dispatch;
mod host;
mod readiness;
mod reconfigure;
mod throttle;
mod zoom;

#[cfg(test)]
mod tests;

pub use camera::{CameraOrchestrator, CaptureCallback, OrchestratorBuilder};
pub use dispatch::{Dispatcher, InlineDispatcher, Task};
#[cfg(feature = "runtime")]
pub use dispatch::{TokioDispatcher, UiQueue};
pub use host::{
    EventSink, HostEvent, NoopPresentation, Presentation, PresentationCall, RecordingEventSink,
    RecordingPresentation,
};
pub use readiness::{Precondition, ReadinessGate, SessionState};
pub use reconfigure::{plan, Action, Rule, RULES};
pub use throttle::{BarcodeThrottle, Clock, ManualClock, SystemClock, ThrottleStats};
pub use zoom::{PinchCommand, PinchPhase, ZoomGesture};
