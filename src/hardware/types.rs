//! Value types shared between the orchestrator and the hardware layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical camera is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

/// Flash behaviour at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlashMode {
    On,
    Off,
    #[default]
    Auto,
}

/// Continuous illumination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TorchMode {
    On,
    #[default]
    Off,
}

/// Tap-to-focus availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusMode {
    #[default]
    On,
    Off,
}

/// Pinch-to-zoom availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoomMode {
    #[default]
    On,
    Off,
}

/// Device orientation reported by the hardware layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Barcode symbologies the recognizer can be asked to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BarcodeType {
    Upce,
    Code39,
    Code39Mod43,
    Ean13,
    Ean8,
    Code93,
    Code128,
    Pdf417,
    Qr,
    Aztec,
    DataMatrix,
    Interleaved2of5,
}

impl BarcodeType {
    /// Every symbology enabled when scanning is on.
    pub const SUPPORTED: [BarcodeType; 12] = [
        BarcodeType::Upce,
        BarcodeType::Code39,
        BarcodeType::Code39Mod43,
        BarcodeType::Ean13,
        BarcodeType::Ean8,
        BarcodeType::Code93,
        BarcodeType::Code128,
        BarcodeType::Pdf417,
        BarcodeType::Qr,
        BarcodeType::Aztec,
        BarcodeType::DataMatrix,
        BarcodeType::Interleaved2of5,
    ];
}

/// Rectangle in view coordinates, used for the scanner frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FrameRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Pixel dimensions of a captured still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Opaque identifier issued by the hardware layer for each capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
