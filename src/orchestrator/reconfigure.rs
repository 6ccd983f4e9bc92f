//! Field-to-action rule table.
//!
//! Each rule names the reconfiguration it performs and the fields that
//! trigger it. Rules run in table order, which encodes the couplings:
//! torch follows facing because torch availability depends on the active
//! camera, and scanning is toggled before the scan frame is shown.

use crate::config::{ChangedFields, ConfigField};

/// One reconfiguration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    UpdateFacing,
    UpdateFlash,
    UpdateTorch,
    OrientationListener,
    ZoomListener,
    RatioOverlay,
    RatioOverlayColor,
    BarcodeScanning,
    ScannerFrame,
    LaserColor,
    FrameColor,
    FocusMode,
    FocusResetTimeout,
    FocusMotionReset,
    ZoomGesture,
    Zoom,
    MaxZoom,
}

/// A row of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub action: Action,
    pub triggers: &'static [ConfigField],
}

/// The rule table, in execution order.
pub const RULES: &[Rule] = &[
    Rule {
        action: Action::UpdateFacing,
        triggers: &[ConfigField::CameraType],
    },
    Rule {
        action: Action::UpdateFlash,
        triggers: &[ConfigField::FlashMode],
    },
    Rule {
        action: Action::UpdateTorch,
        triggers: &[ConfigField::CameraType, ConfigField::TorchMode],
    },
    Rule {
        action: Action::OrientationListener,
        triggers: &[ConfigField::OnOrientationChange],
    },
    Rule {
        action: Action::ZoomListener,
        triggers: &[ConfigField::OnZoom],
    },
    Rule {
        action: Action::RatioOverlay,
        triggers: &[ConfigField::RatioOverlay],
    },
    Rule {
        action: Action::RatioOverlayColor,
        triggers: &[ConfigField::RatioOverlayColor],
    },
    Rule {
        action: Action::BarcodeScanning,
        triggers: &[ConfigField::ScanBarcode, ConfigField::OnReadCode],
    },
    Rule {
        action: Action::ScannerFrame,
        triggers: &[ConfigField::ShowFrame, ConfigField::ScanBarcode],
    },
    Rule {
        action: Action::LaserColor,
        triggers: &[ConfigField::LaserColor],
    },
    Rule {
        action: Action::FrameColor,
        triggers: &[ConfigField::FrameColor],
    },
    Rule {
        action: Action::FocusMode,
        triggers: &[ConfigField::FocusMode],
    },
    Rule {
        action: Action::FocusResetTimeout,
        triggers: &[ConfigField::ResetFocusTimeout],
    },
    Rule {
        action: Action::FocusMotionReset,
        triggers: &[ConfigField::ResetFocusWhenMotionDetected],
    },
    Rule {
        action: Action::ZoomGesture,
        triggers: &[ConfigField::ZoomMode],
    },
    Rule {
        action: Action::Zoom,
        triggers: &[ConfigField::Zoom],
    },
    Rule {
        action: Action::MaxZoom,
        triggers: &[ConfigField::MaxZoom],
    },
];

/// Actions triggered by `changed`, in execution order. Each action
/// appears at most once even when several of its triggers changed.
pub fn plan(changed: &ChangedFields) -> Vec<Action> {
    RULES
        .iter()
        .filter(|rule| changed.contains_any(rule.triggers))
        .map(|rule| rule.action)
        .collect()
}
