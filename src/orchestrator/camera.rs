//! The camera orchestrator.
//!
//! Owns the hardware session and decides when it is built, how property
//! deliveries turn into hardware calls, how still captures are carried to
//! completion and which barcode reads reach the host.

use super::dispatch::{Dispatcher, InlineDispatcher};
use super::host::{EventSink, NoopPresentation, Presentation};
use super::readiness::{Precondition, ReadinessGate, SessionState};
use super::reconfigure::{plan, Action};
use super::throttle::{BarcodeThrottle, Clock, SystemClock};
use super::zoom::{PinchCommand, PinchPhase, ZoomGesture};
use crate::capture::{
    CaptureError, CapturePipeline, CaptureRequest, CaptureResult, CaptureStorage, CapturedImage,
    StorageError,
};
use crate::config::{
    AppliedDiff, CameraConfiguration, ChangedFields, ConfigurationBuffer, Delivery,
    OrchestratorSettings,
};
use crate::hardware::{
    BarcodeListener, BarcodeType, CameraSession, CaptureListener, HardwareError, Orientation,
    OrientationListener, ZoomListener, ZoomMode,
};
use crate::metrics::MetricsSnapshot;
use crate::permission::{PermissionGate, PermissionProvider};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback receiving the outcome of a capture.
pub type CaptureCallback = Box<dyn FnOnce(Result<CaptureResult, CaptureError>) + Send>;

#[derive(Debug, Default)]
struct Counters {
    configuration_updates: AtomicU64,
    reconfigurations: AtomicU64,
    captures_started: AtomicU64,
    captures_succeeded: AtomicU64,
    captures_failed: AtomicU64,
    captured_bytes: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

struct Shared {
    session: Arc<dyn CameraSession>,
    presentation: Arc<dyn Presentation>,
    events: Arc<dyn EventSink>,
    dispatcher: Arc<dyn Dispatcher>,
    clock: Arc<dyn Clock>,
    storage: CaptureStorage,
    settings: OrchestratorSettings,
    readiness: ReadinessGate,
    permission: PermissionGate,
    /// Serializes deliveries so their hardware calls never interleave.
    update_lock: Mutex<()>,
    /// Held while a capture is issued and admitted, so the pipeline sees
    /// requests in issue order.
    issue_lock: Mutex<()>,
    config: Mutex<ConfigurationBuffer>,
    throttle: Mutex<BarcodeThrottle>,
    zoom: Mutex<ZoomGesture>,
    pipeline: CapturePipeline,
    counters: Counters,
    torn_down: AtomicBool,
    released: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`CameraOrchestrator`].
pub struct OrchestratorBuilder {
    session: Arc<dyn CameraSession>,
    permission: Arc<dyn PermissionProvider>,
    events: Arc<dyn EventSink>,
    presentation: Arc<dyn Presentation>,
    dispatcher: Arc<dyn Dispatcher>,
    clock: Arc<dyn Clock>,
    storage: Option<CaptureStorage>,
    settings: OrchestratorSettings,
}

impl OrchestratorBuilder {
    pub fn presentation(mut self, presentation: Arc<dyn Presentation>) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Overrides where captures are written.
    pub fn storage(mut self, storage: CaptureStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the orchestrator and asks for camera access.
    ///
    /// Fails only if no capture directory can be resolved.
    pub fn build(self) -> Result<CameraOrchestrator, StorageError> {
        let storage = match self.storage {
            Some(storage) => storage,
            None => CaptureStorage::in_cache_dir(
                self.settings.cache_dir.as_deref(),
                self.settings.bundle_id.as_deref(),
            )?,
        };

        let shared = Arc::new(Shared {
            session: self.session,
            presentation: self.presentation,
            events: self.events,
            dispatcher: self.dispatcher,
            clock: self.clock,
            storage,
            readiness: ReadinessGate::new(),
            permission: PermissionGate::new(),
            update_lock: Mutex::new(()),
            issue_lock: Mutex::new(()),
            config: Mutex::new(ConfigurationBuffer::new(self.settings.diff_log_capacity)),
            throttle: Mutex::new(BarcodeThrottle::new()),
            zoom: Mutex::new(ZoomGesture::new()),
            pipeline: CapturePipeline::new(),
            counters: Counters::default(),
            torn_down: AtomicBool::new(false),
            released: AtomicBool::new(false),
            settings: self.settings,
        });

        let weak = Arc::downgrade(&shared);
        shared
            .permission
            .request_if_needed(self.permission.as_ref(), move || {
                if let Some(shared) = weak.upgrade() {
                    shared.satisfy(Precondition::PermissionGranted);
                }
            });

        Ok(CameraOrchestrator { shared })
    }
}

/// Drives a [`CameraSession`] from declarative configuration.
pub struct CameraOrchestrator {
    shared: Arc<Shared>,
}

impl CameraOrchestrator {
    /// Starts building an orchestrator around `session`.
    pub fn builder(
        session: Arc<dyn CameraSession>,
        permission: Arc<dyn PermissionProvider>,
        events: Arc<dyn EventSink>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            session,
            permission,
            events,
            presentation: Arc::new(NoopPresentation),
            dispatcher: Arc::new(InlineDispatcher),
            clock: Arc::new(SystemClock),
            storage: None,
            settings: OrchestratorSettings::default(),
        }
    }

    /// Applies one property delivery.
    ///
    /// The first delivery completes the configuration and may build the
    /// session. Every delivery, the first included, then runs the
    /// reconfiguration actions its changed fields trigger, reading the
    /// values from the new snapshot. Call from the UI context.
    pub fn apply_update(&self, changed: &ChangedFields, values: CameraConfiguration) -> Delivery {
        self.shared.apply_update(changed, values)
    }

    /// Takes a still picture and reports the outcome to `on_complete`,
    /// exactly once.
    pub fn capture_with<F>(&self, on_complete: F)
    where
        F: FnOnce(Result<CaptureResult, CaptureError>) + Send + 'static,
    {
        self.shared.capture(Box::new(on_complete));
    }

    /// Takes a still picture with separate success and error callbacks.
    pub fn capture<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(CaptureResult) + Send + 'static,
        E: FnOnce(CaptureError) + Send + 'static,
    {
        self.capture_with(move |outcome| match outcome {
            Ok(result) => on_success(result),
            Err(err) => on_error(err),
        });
    }

    /// Takes a still picture and awaits the outcome.
    #[cfg(feature = "runtime")]
    pub async fn capture_async(&self) -> Result<CaptureResult, CaptureError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.capture_with(move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.await
            .unwrap_or_else(|_| Err(CaptureError::CaptureFailed("capture abandoned".into())))
    }

    /// Feeds a decoded barcode through the throttle.
    pub fn on_barcode_read(&self, code: &str) {
        self.shared.on_barcode_read(code);
    }

    /// Feeds a pinch recognizer phase.
    pub fn pinch(&self, phase: PinchPhase) {
        self.shared.pinch(phase);
    }

    /// Re-sends the scanner frame after the view bounds changed.
    pub fn relayout(&self) {
        self.shared.send_scanner_frame();
    }

    /// Releases the hardware session. Later calls do nothing, and so do
    /// deliveries, reads and gestures; captures report
    /// [`CaptureError::HardwareUnavailable`].
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    pub fn session_state(&self) -> SessionState {
        self.shared.readiness.state()
    }

    pub fn is_session_initialized(&self) -> bool {
        self.shared.readiness.is_initialized()
    }

    /// Current configuration snapshot.
    pub fn configuration(&self) -> CameraConfiguration {
        lock(&self.shared.config).current().clone()
    }

    /// Retained deliveries, oldest first.
    pub fn applied_diffs(&self) -> Vec<AppliedDiff> {
        lock(&self.shared.config).log().cloned().collect()
    }

    pub fn captures_in_flight(&self) -> usize {
        self.shared.pipeline.in_flight()
    }

    pub fn storage(&self) -> &CaptureStorage {
        &self.shared.storage
    }

    /// Collects counters for the metrics registry.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = &self.shared.counters;
        let throttle = lock(&self.shared.throttle).stats();
        MetricsSnapshot {
            session_initialized: self.is_session_initialized(),
            configuration_updates: counters.configuration_updates.load(Ordering::Relaxed),
            reconfigurations: counters.reconfigurations.load(Ordering::Relaxed),
            captures_started: counters.captures_started.load(Ordering::Relaxed),
            captures_succeeded: counters.captures_succeeded.load(Ordering::Relaxed),
            captures_failed: counters.captures_failed.load(Ordering::Relaxed),
            captured_bytes: counters.captured_bytes.load(Ordering::Relaxed),
            captures_in_flight: self.shared.pipeline.in_flight(),
            barcodes_accepted: throttle.accepted,
            barcodes_throttled: throttle.throttled,
        }
    }
}

impl Shared {
    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn satisfy(&self, precondition: Precondition) {
        if self.is_torn_down() {
            return;
        }
        if self.readiness.satisfy(precondition) {
            self.initialize_session();
        }
    }

    fn initialize_session(&self) {
        let (facing, wants_barcodes) = {
            let config = lock(&self.config);
            let current = config.current();
            (current.camera_type, current.wants_barcodes())
        };
        let types: &[BarcodeType] = if wants_barcodes {
            &BarcodeType::SUPPORTED
        } else {
            &[]
        };

        match self.session.setup(facing, types) {
            Ok(()) => {
                self.readiness.complete(true);
                tracing::info!(?facing, barcodes = types.len(), "Camera session initialized");
                // Teardown may have run while setup was in progress
                if self.is_torn_down() {
                    self.release_session();
                }
            }
            Err(e) => {
                self.readiness.complete(false);
                tracing::error!(error = %e, "Camera session setup failed");
            }
        }
    }

    fn apply_update(
        self: &Arc<Self>,
        changed: &ChangedFields,
        values: CameraConfiguration,
    ) -> Delivery {
        let _serial = lock(&self.update_lock);

        let (delivery, current) = {
            let mut config = lock(&self.config);
            let delivery = config.apply(changed, values);
            (delivery, config.current().clone())
        };

        if self.is_torn_down() {
            tracing::debug!(version = delivery.version, "Configuration after teardown ignored");
            return delivery;
        }
        Counters::bump(&self.counters.configuration_updates, 1);

        if delivery.first {
            self.satisfy(Precondition::ConfigurationDelivered);
            if self.is_torn_down() {
                return delivery;
            }
        }

        let actions = plan(changed);
        tracing::debug!(
            version = delivery.version,
            changed = changed.len(),
            actions = actions.len(),
            "Applying configuration"
        );
        for action in &actions {
            self.perform(*action, &current);
        }
        Counters::bump(&self.counters.reconfigurations, actions.len() as u64);

        delivery
    }

    fn perform(self: &Arc<Self>, action: Action, config: &CameraConfiguration) {
        tracing::trace!(?action, "Reconfiguring");
        match action {
            Action::UpdateFacing => self.session.update_facing(config.camera_type),
            Action::UpdateFlash => self.session.update_flash(config.flash_mode),
            Action::UpdateTorch => self.session.update_torch(config.torch_mode),
            Action::OrientationListener => {
                let listener = config.on_orientation_change.then(|| {
                    let weak = Arc::downgrade(self);
                    Arc::new(move |orientation: Orientation| {
                        if let Some(shared) = weak.upgrade() {
                            shared.events.on_orientation_change(orientation);
                        }
                    }) as OrientationListener
                });
                self.session.set_orientation_listener(listener);
            }
            Action::ZoomListener => {
                let listener = config.on_zoom.then(|| {
                    let weak = Arc::downgrade(self);
                    Arc::new(move |zoom: f64| {
                        if let Some(shared) = weak.upgrade() {
                            shared.events.on_zoom(zoom);
                        }
                    }) as ZoomListener
                });
                self.session.set_zoom_listener(listener);
            }
            Action::RatioOverlay => self
                .presentation
                .set_ratio_overlay(config.ratio_overlay.as_deref(), config.ratio_overlay_color),
            Action::RatioOverlayColor => {
                if let Some(color) = config.ratio_overlay_color {
                    self.presentation.set_ratio_overlay_color(color);
                }
            }
            Action::BarcodeScanning => {
                let weak = Arc::downgrade(self);
                let listener: BarcodeListener = Arc::new(move |code: String| {
                    if let Some(shared) = weak.upgrade() {
                        shared.on_barcode_read(&code);
                    }
                });
                self.session.set_barcode_scanning(
                    config.scan_barcode,
                    &BarcodeType::SUPPORTED,
                    Some(listener),
                );
            }
            Action::ScannerFrame => {
                let weak = Arc::downgrade(self);
                self.dispatcher.run_on_ui(Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.send_scanner_frame();
                    }
                }));
            }
            Action::LaserColor => {
                if let Some(color) = config.laser_color {
                    self.presentation.set_laser_color(color);
                }
            }
            Action::FrameColor => {
                if let Some(color) = config.frame_color {
                    self.presentation.set_frame_color(color);
                }
            }
            Action::FocusMode => self.presentation.set_focus_mode(config.focus_mode),
            Action::FocusResetTimeout => self
                .presentation
                .set_focus_reset_timeout(config.focus_reset_timeout()),
            Action::FocusMotionReset => self
                .presentation
                .set_focus_reset_on_motion(config.reset_focus_when_motion_detected),
            Action::ZoomGesture => {
                let attached = config.zoom_mode == ZoomMode::On;
                if lock(&self.zoom).set_attached(attached) {
                    self.presentation.set_zoom_gesture_attached(attached);
                }
            }
            Action::Zoom => self.session.update_zoom(config.zoom),
            Action::MaxZoom => self.session.update_max_zoom(config.max_zoom),
        }
    }

    /// Shows or hides the scan frame from the current snapshot and tells
    /// the session which region to scan.
    fn send_scanner_frame(&self) {
        let show = lock(&self.config).current().show_frame;
        self.presentation.set_scanner_frame_visible(show);
        let frame = show.then(|| self.presentation.scanner_frame());
        self.session.update_scanner_frame(frame);
    }

    fn on_barcode_read(&self, code: &str) {
        if self.is_torn_down() {
            return;
        }
        let (interval, forward) = {
            let config = lock(&self.config);
            let current = config.current();
            (current.scan_throttle(), current.on_read_code)
        };
        let now = self.clock.now();
        if !lock(&self.throttle).offer(now, interval) {
            return;
        }
        if forward {
            tracing::debug!(code, "Barcode read forwarded");
            self.events.on_read_code(code);
        }
    }

    fn pinch(&self, phase: PinchPhase) {
        if self.is_torn_down() {
            return;
        }
        let command = lock(&self.zoom).handle(phase);
        match command {
            Some(PinchCommand::Start) => self.session.pinch_start(),
            Some(PinchCommand::Change(scale)) => self.session.pinch_change(scale),
            None => {}
        }
    }

    fn capture(self: &Arc<Self>, on_complete: CaptureCallback) {
        if self.is_torn_down() || !self.readiness.is_initialized() {
            let cause = if self.is_torn_down() || self.readiness.state() == SessionState::Failed {
                HardwareError::Unavailable
            } else {
                HardwareError::NotInitialized
            };
            tracing::warn!(error = %cause, "Capture requested without a camera session");
            Counters::bump(&self.counters.captures_failed, 1);
            on_complete(Err(CaptureError::HardwareUnavailable(cause)));
            return;
        }

        let on_will_capture = {
            let weak = Arc::downgrade(self);
            move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let fade = shared.settings.shutter_fade();
                let presentation = Arc::clone(&shared.presentation);
                shared
                    .dispatcher
                    .run_on_ui(Box::new(move || presentation.shutter_effect(fade)));
            }
        };

        let on_terminal = {
            let weak = Arc::downgrade(self);
            move |outcome: Result<CapturedImage, CaptureError>| {
                let Some(shared) = weak.upgrade() else {
                    tracing::debug!("Capture finished after the camera view went away");
                    return;
                };
                match outcome {
                    Ok(image) => {
                        let worker = Arc::clone(&shared);
                        shared.dispatcher.run_in_background(Box::new(move || {
                            worker.finish_capture(image, on_complete);
                        }));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Capture failed");
                        Counters::bump(&shared.counters.captures_failed, 1);
                        on_complete(Err(err));
                    }
                }
            }
        };

        let request = CaptureRequest::new(on_will_capture, on_terminal);
        let listener: CaptureListener = {
            let weak: Weak<Shared> = Arc::downgrade(self);
            Arc::new(move |id, event| {
                if let Some(shared) = weak.upgrade() {
                    shared.pipeline.handle(id, event);
                }
            })
        };

        let issued = {
            let _issue = lock(&self.issue_lock);
            match self.session.capture_picture(listener) {
                Ok(id) => Ok((id, self.pipeline.admit(id, request))),
                Err(e) => {
                    self.pipeline.discard_parked();
                    Err((e, request))
                }
            }
        };

        match issued {
            Ok((id, parked)) => {
                Counters::bump(&self.counters.captures_started, 1);
                tracing::debug!(request = %id, "Capture issued");
                self.pipeline.replay(id, parked);
            }
            Err((e, request)) => {
                tracing::warn!(error = %e, "Capture could not be issued");
                request.fail(e.into());
            }
        }
    }

    /// Persists a captured image and reports the result. Runs on a
    /// background worker.
    fn finish_capture(&self, image: CapturedImage, on_complete: CaptureCallback) {
        if image.thumbnail.is_some() {
            tracing::trace!("Thumbnail data received but not persisted");
        }

        let outcome = self.storage.persist(&image.image);
        self.presentation.reset_focus();

        match outcome {
            Ok(stored) => {
                let size = image.image.len();
                Counters::bump(&self.counters.captures_succeeded, 1);
                Counters::bump(&self.counters.captured_bytes, size as u64);
                tracing::info!(
                    name = %stored.name,
                    size,
                    width = image.dimensions.width,
                    height = image.dimensions.height,
                    "Capture saved"
                );
                on_complete(Ok(CaptureResult {
                    size,
                    uri: stored.uri,
                    name: stored.name,
                    thumb: String::new(),
                }));
            }
            Err(e) => {
                let err = CaptureError::FileWriteFailed(e);
                tracing::error!(error = %err, "Capture could not be saved");
                Counters::bump(&self.counters.captures_failed, 1);
                on_complete(Err(err));
            }
        }
    }

    fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.readiness.is_initialized() {
            self.release_session();
        }
    }

    /// Tears the hardware session down, at most once.
    fn release_session(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.session.teardown();
        tracing::info!("Camera session torn down");
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.teardown();
    }
}
