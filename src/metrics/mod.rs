//! Prometheus metrics for camera monitoring.
//!
//! # Metrics Exposed
//!
//! ## Lifecycle
//! - `camera_kit_session_initialized` - Whether the session is set up (1/0)
//! - `camera_kit_configuration_updates_total` - Configuration deliveries applied
//! - `camera_kit_reconfigurations_total` - Reconfiguration actions performed
//!
//! ## Capture
//! - `camera_kit_captures_started_total` - Requests issued to the hardware
//! - `camera_kit_captures_succeeded_total` - Captures persisted and reported
//! - `camera_kit_captures_failed_total` - Captures ending in an error callback
//! - `camera_kit_captured_bytes_total` - Bytes of image data persisted
//! - `camera_kit_captures_in_flight` - Requests awaiting a terminal event
//!
//! ## Scanner
//! - `camera_kit_barcodes_accepted_total` - Reads forwarded to the host
//! - `camera_kit_barcodes_throttled_total` - Reads dropped by the throttle
//!
//! # Example
//!
//! ```no_run
//! use camera_kit::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     session_initialized: true,
//!     captures_started: 3,
//!     captures_succeeded: 3,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
