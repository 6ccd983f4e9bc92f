//! Camera Kit Library
//!
//! Lifecycle and property-synchronization core for a declarative camera
//! component. The host delivers property snapshots; the library decides
//! when the hardware session is built, turns each delivery into targeted
//! hardware calls, carries still captures to a file on disk and throttles
//! barcode reads.
//!
//! # Architecture
//!
//! ```text
//! permission ─┐
//!             ├─→ orchestrator ─→ hardware session
//! config ─────┘        │
//!                      ├─→ capture (pipeline → storage)
//!                      └─→ metrics
//! ```
//!
//! # Design Principles
//!
//! - **Build once**: the session is set up exactly once, after both camera
//!   permission and the first configuration have arrived, in either order
//! - **Targeted updates**: a delivery touches only the hardware state its
//!   changed fields affect
//! - **Exactly one outcome**: every capture ends in one success or one
//!   error callback
//! - **No dangling work**: callbacks arriving after the component is gone
//!   do nothing
//!
//! # Example
//!
//! ```no_run
//! use camera_kit::{
//!     config::{CameraConfiguration, ChangedFields, ConfigField},
//!     hardware::{CameraFacing, MockCameraSession},
//!     orchestrator::{CameraOrchestrator, RecordingEventSink},
//!     permission::StaticPermission,
//! };
//! use std::sync::Arc;
//!
//! let session = Arc::new(MockCameraSession::new());
//! let orchestrator = CameraOrchestrator::builder(
//!     session.clone(),
//!     Arc::new(StaticPermission::granted()),
//!     Arc::new(RecordingEventSink::new()),
//! )
//! .build()
//! .unwrap();
//!
//! // First delivery builds the session
//! orchestrator.apply_update(&ChangedFields::all(), CameraConfiguration::default());
//!
//! // Later deliveries only touch what changed
//! let front = CameraConfiguration {
//!     camera_type: CameraFacing::Front,
//!     ..Default::default()
//! };
//! orchestrator.apply_update(&ChangedFields::from([ConfigField::CameraType]), front);
//!
//! orchestrator.capture_with(|outcome| match outcome {
//!     Ok(result) => println!("saved {} bytes to {}", result.size, result.uri),
//!     Err(e) => eprintln!("capture failed: {}", e),
//! });
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod hardware;
pub mod metrics;
pub mod orchestrator;
pub mod permission;

// Re-export commonly used types at crate root
pub use capture::{CaptureError, CaptureResult, CaptureStorage};
pub use config::{CameraConfiguration, ChangedFields, ConfigField, FileConfig};
pub use hardware::{CameraSession, HardwareError, MockCameraSession};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use orchestrator::{CameraOrchestrator, EventSink, OrchestratorBuilder, Presentation};
pub use permission::{PermissionGate, PermissionProvider};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
