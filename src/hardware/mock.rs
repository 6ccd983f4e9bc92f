//! Scriptable in-memory camera session.
//!
//! Records every call it receives so tests and the demo binary can assert on
//! the exact hardware traffic the orchestrator produced.

use super::session::{
    BarcodeListener, CameraSession, CaptureEvent, CaptureListener, HardwareError,
    OrientationListener, ZoomListener,
};
use super::types::{
    BarcodeType, CameraFacing, Dimensions, FlashMode, FrameRect, Orientation, RequestId,
    TorchMode,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One call received by [`MockCameraSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareCall {
    Setup {
        facing: CameraFacing,
        barcode_types: Vec<BarcodeType>,
    },
    Teardown,
    Facing(CameraFacing),
    Flash(FlashMode),
    Torch(TorchMode),
    Zoom(Option<f64>),
    MaxZoom(Option<f64>),
    ScannerFrame(Option<FrameRect>),
    OrientationListener { registered: bool },
    ZoomListener { registered: bool },
    BarcodeScanning { enabled: bool, listener: bool },
    CapturePicture(RequestId),
    PinchStart,
    PinchChange(f64),
}

impl HardwareCall {
    /// Returns true for calls that change device state, as opposed to
    /// lifecycle, listener wiring, capture or gesture traffic.
    pub fn is_reconfiguration(&self) -> bool {
        matches!(
            self,
            HardwareCall::Facing(_)
                | HardwareCall::Flash(_)
                | HardwareCall::Torch(_)
                | HardwareCall::Zoom(_)
                | HardwareCall::MaxZoom(_)
                | HardwareCall::ScannerFrame(_)
                | HardwareCall::BarcodeScanning { .. }
        )
    }
}

/// How the mock answers `capture_picture`.
#[derive(Debug, Clone)]
pub enum CaptureBehavior {
    /// Emit will-capture then success before returning.
    Succeed {
        image: Vec<u8>,
        thumbnail: Option<Vec<u8>>,
        dimensions: Dimensions,
    },
    /// Emit will-capture then a failure before returning.
    Fail(String),
    /// Keep the request open until [`MockCameraSession::emit_capture`].
    Hold,
    /// Refuse to issue a request at all.
    Reject(String),
}

impl Default for CaptureBehavior {
    fn default() -> Self {
        CaptureBehavior::Succeed {
            image: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9],
            thumbnail: None,
            dimensions: Dimensions {
                width: 4032,
                height: 3024,
            },
        }
    }
}

/// Runs inside `setup`, before it returns.
pub type SetupHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct MockState {
    calls: Vec<HardwareCall>,
    setup_error: Option<String>,
    setup_hook: Option<SetupHook>,
    capture_behavior: CaptureBehavior,
    next_request: i64,
    held: HashMap<RequestId, CaptureListener>,
    barcode_listener: Option<BarcodeListener>,
    orientation_listener: Option<OrientationListener>,
    zoom_listener: Option<ZoomListener>,
}

/// Mock camera session for tests and demos.
#[derive(Default)]
pub struct MockCameraSession {
    state: Mutex<MockState>,
}

impl MockCameraSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `setup` call fail with the given reason.
    pub fn fail_setup(&self, reason: impl Into<String>) {
        self.lock().setup_error = Some(reason.into());
    }

    /// Runs `hook` during the next `setup`, after the call is recorded and
    /// before the outcome is returned. Lets tests act while setup is in
    /// progress.
    pub fn on_next_setup(&self, hook: impl FnOnce() + Send + 'static) {
        self.lock().setup_hook = Some(Box::new(hook));
    }

    /// Changes how subsequent captures are answered.
    pub fn set_capture_behavior(&self, behavior: CaptureBehavior) {
        self.lock().capture_behavior = behavior;
    }

    /// Returns a copy of every call received so far.
    pub fn calls(&self) -> Vec<HardwareCall> {
        self.lock().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of `setup` calls received.
    pub fn setup_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, HardwareCall::Setup { .. }))
            .count()
    }

    /// Ids of capture requests still held open.
    pub fn held_requests(&self) -> Vec<RequestId> {
        let mut ids: Vec<_> = self.lock().held.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Delivers an event for a held request. Terminal events release it.
    /// Returns false if no such request is held.
    pub fn emit_capture(&self, id: RequestId, event: CaptureEvent) -> bool {
        let listener = {
            let mut state = self.lock();
            if event.is_terminal() {
                state.held.remove(&id)
            } else {
                state.held.get(&id).cloned()
            }
        };
        match listener {
            Some(listener) => {
                listener(id, event);
                true
            }
            None => false,
        }
    }

    /// Simulates the recognizer decoding a barcode.
    pub fn emit_barcode(&self, value: &str) -> bool {
        let listener = self.lock().barcode_listener.clone();
        match listener {
            Some(listener) => {
                listener(value.to_string());
                true
            }
            None => false,
        }
    }

    /// Simulates a device rotation.
    pub fn emit_orientation(&self, orientation: Orientation) -> bool {
        let listener = self.lock().orientation_listener.clone();
        listener.map(|l| l(orientation)).is_some()
    }

    /// Simulates the session reporting a new zoom factor.
    pub fn emit_zoom(&self, zoom: f64) -> bool {
        let listener = self.lock().zoom_listener.clone();
        listener.map(|l| l(zoom)).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: HardwareCall) {
        self.lock().calls.push(call);
    }
}

impl CameraSession for MockCameraSession {
    fn setup(
        &self,
        facing: CameraFacing,
        barcode_types: &[BarcodeType],
    ) -> Result<(), HardwareError> {
        let (error, hook) = {
            let mut state = self.lock();
            state.calls.push(HardwareCall::Setup {
                facing,
                barcode_types: barcode_types.to_vec(),
            });
            (state.setup_error.take(), state.setup_hook.take())
        };
        if let Some(hook) = hook {
            hook();
        }
        match error {
            Some(reason) => Err(HardwareError::SetupFailed(reason)),
            None => {
                tracing::info!(?facing, barcodes = barcode_types.len(), "MockCameraSession set up");
                Ok(())
            }
        }
    }

    fn teardown(&self) {
        let mut state = self.lock();
        // Held requests survive, like a device still finishing a shot.
        state.calls.push(HardwareCall::Teardown);
        state.barcode_listener = None;
        state.orientation_listener = None;
        state.zoom_listener = None;
        tracing::info!("MockCameraSession torn down");
    }

    fn update_facing(&self, facing: CameraFacing) {
        self.record(HardwareCall::Facing(facing));
    }

    fn update_flash(&self, mode: FlashMode) {
        self.record(HardwareCall::Flash(mode));
    }

    fn update_torch(&self, mode: TorchMode) {
        self.record(HardwareCall::Torch(mode));
    }

    fn update_zoom(&self, zoom: Option<f64>) {
        self.record(HardwareCall::Zoom(zoom));
    }

    fn update_max_zoom(&self, max_zoom: Option<f64>) {
        self.record(HardwareCall::MaxZoom(max_zoom));
    }

    fn update_scanner_frame(&self, frame: Option<FrameRect>) {
        self.record(HardwareCall::ScannerFrame(frame));
    }

    fn set_orientation_listener(&self, listener: Option<OrientationListener>) {
        let mut state = self.lock();
        state.calls.push(HardwareCall::OrientationListener {
            registered: listener.is_some(),
        });
        state.orientation_listener = listener;
    }

    fn set_zoom_listener(&self, listener: Option<ZoomListener>) {
        let mut state = self.lock();
        state.calls.push(HardwareCall::ZoomListener {
            registered: listener.is_some(),
        });
        state.zoom_listener = listener;
    }

    fn set_barcode_scanning(
        &self,
        enabled: bool,
        _types: &[BarcodeType],
        listener: Option<BarcodeListener>,
    ) {
        let mut state = self.lock();
        state.calls.push(HardwareCall::BarcodeScanning {
            enabled,
            listener: listener.is_some(),
        });
        state.barcode_listener = if enabled { listener } else { None };
    }

    fn capture_picture(&self, listener: CaptureListener) -> Result<RequestId, HardwareError> {
        let (id, behavior) = {
            let mut state = self.lock();
            if let CaptureBehavior::Reject(reason) = &state.capture_behavior {
                return Err(HardwareError::CaptureRejected(reason.clone()));
            }
            state.next_request += 1;
            let id = RequestId(state.next_request);
            state.calls.push(HardwareCall::CapturePicture(id));
            (id, state.capture_behavior.clone())
        };

        // Answer outside the lock; the listener may call back into us.
        match behavior {
            CaptureBehavior::Succeed {
                image,
                thumbnail,
                dimensions,
            } => {
                listener(id, CaptureEvent::WillCapture);
                listener(
                    id,
                    CaptureEvent::Succeeded {
                        image,
                        thumbnail,
                        dimensions,
                    },
                );
            }
            CaptureBehavior::Fail(message) => {
                listener(id, CaptureEvent::WillCapture);
                listener(id, CaptureEvent::Failed { message });
            }
            CaptureBehavior::Hold => {
                self.lock().held.insert(id, listener);
            }
            CaptureBehavior::Reject(_) => {}
        }
        Ok(id)
    }

    fn pinch_start(&self) {
        self.record(HardwareCall::PinchStart);
    }

    fn pinch_change(&self, scale: f64) {
        self.record(HardwareCall::PinchChange(scale));
    }
}
