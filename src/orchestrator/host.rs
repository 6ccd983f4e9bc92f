//! Seams toward the host view layer.
//!
//! [`Presentation`] covers the on-screen pieces the orchestrator toggles
//! (shutter flash, overlays, focus reticle, gesture recognizer).
//! [`EventSink`] receives the component's outbound events.

use crate::config::Color;
use crate::hardware::{FocusMode, FrameRect, Orientation};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Presentation layer driven by the orchestrator. Methods are called on
/// the UI context unless noted.
pub trait Presentation: Send + Sync {
    /// Hides the preview, then fades it back in over `fade_in`.
    fn shutter_effect(&self, fade_in: Duration);

    /// Shows, updates or removes the aspect-ratio overlay.
    fn set_ratio_overlay(&self, ratio: Option<&str>, color: Option<Color>);

    fn set_ratio_overlay_color(&self, color: Color);

    fn set_scanner_frame_visible(&self, visible: bool);

    /// Region of the scanner frame in view coordinates.
    fn scanner_frame(&self) -> FrameRect;

    fn set_laser_color(&self, color: Color);

    fn set_frame_color(&self, color: Color);

    fn set_focus_mode(&self, mode: FocusMode);

    fn set_focus_reset_timeout(&self, timeout: Option<Duration>);

    fn set_focus_reset_on_motion(&self, enabled: bool);

    /// Clears any tap-to-focus lock. May be called from a background worker.
    fn reset_focus(&self);

    /// Attaches or detaches the pinch recognizer.
    fn set_zoom_gesture_attached(&self, attached: bool);
}

/// Receiver of the component's outbound events.
pub trait EventSink: Send + Sync {
    fn on_orientation_change(&self, orientation: Orientation);

    fn on_zoom(&self, zoom: f64);

    fn on_read_code(&self, code: &str);
}

/// Presentation that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPresentation;

impl Presentation for NoopPresentation {
    fn shutter_effect(&self, _fade_in: Duration) {}
    fn set_ratio_overlay(&self, _ratio: Option<&str>, _color: Option<Color>) {}
    fn set_ratio_overlay_color(&self, _color: Color) {}
    fn set_scanner_frame_visible(&self, _visible: bool) {}
    fn scanner_frame(&self) -> FrameRect {
        FrameRect::default()
    }
    fn set_laser_color(&self, _color: Color) {}
    fn set_frame_color(&self, _color: Color) {}
    fn set_focus_mode(&self, _mode: FocusMode) {}
    fn set_focus_reset_timeout(&self, _timeout: Option<Duration>) {}
    fn set_focus_reset_on_motion(&self, _enabled: bool) {}
    fn reset_focus(&self) {}
    fn set_zoom_gesture_attached(&self, _attached: bool) {}
}

/// One call received by [`RecordingPresentation`].
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCall {
    Shutter(Duration),
    RatioOverlay(Option<String>),
    RatioOverlayColor(Color),
    ScannerFrameVisible(bool),
    LaserColor(Color),
    FrameColor(Color),
    FocusMode(FocusMode),
    FocusResetTimeout(Option<Duration>),
    FocusResetOnMotion(bool),
    ResetFocus,
    ZoomGestureAttached(bool),
}

/// Presentation that records calls, for tests and the demo binary.
#[derive(Debug)]
pub struct RecordingPresentation {
    frame: FrameRect,
    calls: Mutex<Vec<PresentationCall>>,
}

impl RecordingPresentation {
    pub fn new(frame: FrameRect) -> Self {
        Self {
            frame,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PresentationCall> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PresentationCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: PresentationCall) {
        self.lock().push(call);
    }
}

impl Default for RecordingPresentation {
    fn default() -> Self {
        Self::new(FrameRect::new(40.0, 200.0, 300.0, 200.0))
    }
}

impl Presentation for RecordingPresentation {
    fn shutter_effect(&self, fade_in: Duration) {
        self.record(PresentationCall::Shutter(fade_in));
    }

    fn set_ratio_overlay(&self, ratio: Option<&str>, _color: Option<Color>) {
        self.record(PresentationCall::RatioOverlay(ratio.map(str::to_string)));
    }

    fn set_ratio_overlay_color(&self, color: Color) {
        self.record(PresentationCall::RatioOverlayColor(color));
    }

    fn set_scanner_frame_visible(&self, visible: bool) {
        self.record(PresentationCall::ScannerFrameVisible(visible));
    }

    fn scanner_frame(&self) -> FrameRect {
        self.frame
    }

    fn set_laser_color(&self, color: Color) {
        self.record(PresentationCall::LaserColor(color));
    }

    fn set_frame_color(&self, color: Color) {
        self.record(PresentationCall::FrameColor(color));
    }

    fn set_focus_mode(&self, mode: FocusMode) {
        self.record(PresentationCall::FocusMode(mode));
    }

    fn set_focus_reset_timeout(&self, timeout: Option<Duration>) {
        self.record(PresentationCall::FocusResetTimeout(timeout));
    }

    fn set_focus_reset_on_motion(&self, enabled: bool) {
        self.record(PresentationCall::FocusResetOnMotion(enabled));
    }

    fn reset_focus(&self) {
        self.record(PresentationCall::ResetFocus);
    }

    fn set_zoom_gesture_attached(&self, attached: bool) {
        self.record(PresentationCall::ZoomGestureAttached(attached));
    }
}

/// Outbound event as recorded by [`RecordingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    OrientationChange(Orientation),
    Zoom(f64),
    ReadCode { code_string_value: String },
}

/// Event sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Decoded values of every forwarded read, in order.
    pub fn read_codes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::ReadCode { code_string_value } => Some(code_string_value),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: HostEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl EventSink for RecordingEventSink {
    fn on_orientation_change(&self, orientation: Orientation) {
        self.push(HostEvent::OrientationChange(orientation));
    }

    fn on_zoom(&self, zoom: f64) {
        self.push(HostEvent::Zoom(zoom));
    }

    fn on_read_code(&self, code: &str) {
        self.push(HostEvent::ReadCode {
            code_string_value: code.to_string(),
        });
    }
}
