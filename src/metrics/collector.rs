//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of orchestrator state for metrics update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Whether the hardware session has been built.
    pub session_initialized: bool,
    /// Configuration deliveries applied.
    pub configuration_updates: u64,
    /// Reconfiguration actions performed.
    pub reconfigurations: u64,
    /// Capture requests issued to the hardware.
    pub captures_started: u64,
    /// Captures persisted and reported to the host.
    pub captures_succeeded: u64,
    /// Captures that ended in an error callback.
    pub captures_failed: u64,
    /// Bytes of image data persisted.
    pub captured_bytes: u64,
    /// Capture requests awaiting a terminal event.
    pub captures_in_flight: usize,
    /// Barcode reads forwarded to the host.
    pub barcodes_accepted: u64,
    /// Barcode reads dropped by the throttle.
    pub barcodes_throttled: u64,
}

/// Prometheus metrics registry for camera monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Lifecycle
    session_initialized: IntGauge,
    configuration_updates: IntCounter,
    reconfigurations: IntCounter,

    // Capture
    captures_started: IntCounter,
    captures_succeeded: IntCounter,
    captures_failed: IntCounter,
    captured_bytes: IntCounter,
    captures_in_flight: IntGauge,

    // Scanner
    barcodes_accepted: IntCounter,
    barcodes_throttled: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all camera metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let session_initialized = IntGauge::new(
            "camera_kit_session_initialized",
            "Whether the camera session is set up (1=yes, 0=no)",
        )?;
        let configuration_updates = IntCounter::new(
            "camera_kit_configuration_updates_total",
            "Configuration deliveries applied",
        )?;
        let reconfigurations = IntCounter::new(
            "camera_kit_reconfigurations_total",
            "Reconfiguration actions performed",
        )?;

        let captures_started = IntCounter::new(
            "camera_kit_captures_started_total",
            "Capture requests issued to the hardware",
        )?;
        let captures_succeeded = IntCounter::new(
            "camera_kit_captures_succeeded_total",
            "Captures persisted and reported to the host",
        )?;
        let captures_failed = IntCounter::new(
            "camera_kit_captures_failed_total",
            "Captures that ended in an error callback",
        )?;
        let captured_bytes = IntCounter::new(
            "camera_kit_captured_bytes_total",
            "Bytes of image data persisted",
        )?;
        let captures_in_flight = IntGauge::new(
            "camera_kit_captures_in_flight",
            "Capture requests awaiting a terminal event",
        )?;

        let barcodes_accepted = IntCounter::new(
            "camera_kit_barcodes_accepted_total",
            "Barcode reads forwarded to the host",
        )?;
        let barcodes_throttled = IntCounter::new(
            "camera_kit_barcodes_throttled_total",
            "Barcode reads dropped by the throttle",
        )?;

        registry.register(Box::new(session_initialized.clone()))?;
        registry.register(Box::new(configuration_updates.clone()))?;
        registry.register(Box::new(reconfigurations.clone()))?;
        registry.register(Box::new(captures_started.clone()))?;
        registry.register(Box::new(captures_succeeded.clone()))?;
        registry.register(Box::new(captures_failed.clone()))?;
        registry.register(Box::new(captured_bytes.clone()))?;
        registry.register(Box::new(captures_in_flight.clone()))?;
        registry.register(Box::new(barcodes_accepted.clone()))?;
        registry.register(Box::new(barcodes_throttled.clone()))?;

        Ok(Self {
            registry,
            session_initialized,
            configuration_updates,
            reconfigurations,
            captures_started,
            captures_succeeded,
            captures_failed,
            captured_bytes,
            captures_in_flight,
            barcodes_accepted,
            barcodes_throttled,
        })
    }

    /// Updates all metrics from a snapshot of orchestrator state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.session_initialized
            .set(if snapshot.session_initialized { 1 } else { 0 });
        self.captures_in_flight.set(snapshot.captures_in_flight as i64);

        // Counters only move forward, so add the difference
        advance(&self.configuration_updates, snapshot.configuration_updates);
        advance(&self.reconfigurations, snapshot.reconfigurations);
        advance(&self.captures_started, snapshot.captures_started);
        advance(&self.captures_succeeded, snapshot.captures_succeeded);
        advance(&self.captures_failed, snapshot.captures_failed);
        advance(&self.captured_bytes, snapshot.captured_bytes);
        advance(&self.barcodes_accepted, snapshot.barcodes_accepted);
        advance(&self.barcodes_throttled, snapshot.barcodes_throttled);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}
