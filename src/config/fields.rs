//! Field names of the host property surface.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One independently-settable property of the camera component.
///
/// Names follow the host binding's camelCase spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigField {
    CameraType,
    FlashMode,
    TorchMode,
    RatioOverlay,
    RatioOverlayColor,
    ScanBarcode,
    ShowFrame,
    OnReadCode,
    ScanThrottleDelay,
    FrameColor,
    LaserColor,
    OnOrientationChange,
    OnZoom,
    ResetFocusTimeout,
    ResetFocusWhenMotionDetected,
    FocusMode,
    ZoomMode,
    Zoom,
    MaxZoom,
}

impl ConfigField {
    pub const ALL: [ConfigField; 19] = [
        ConfigField::CameraType,
        ConfigField::FlashMode,
        ConfigField::TorchMode,
        ConfigField::RatioOverlay,
        ConfigField::RatioOverlayColor,
        ConfigField::ScanBarcode,
        ConfigField::ShowFrame,
        ConfigField::OnReadCode,
        ConfigField::ScanThrottleDelay,
        ConfigField::FrameColor,
        ConfigField::LaserColor,
        ConfigField::OnOrientationChange,
        ConfigField::OnZoom,
        ConfigField::ResetFocusTimeout,
        ConfigField::ResetFocusWhenMotionDetected,
        ConfigField::FocusMode,
        ConfigField::ZoomMode,
        ConfigField::Zoom,
        ConfigField::MaxZoom,
    ];

    /// The host-side property name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::CameraType => "cameraType",
            ConfigField::FlashMode => "flashMode",
            ConfigField::TorchMode => "torchMode",
            ConfigField::RatioOverlay => "ratioOverlay",
            ConfigField::RatioOverlayColor => "ratioOverlayColor",
            ConfigField::ScanBarcode => "scanBarcode",
            ConfigField::ShowFrame => "showFrame",
            ConfigField::OnReadCode => "onReadCode",
            ConfigField::ScanThrottleDelay => "scanThrottleDelay",
            ConfigField::FrameColor => "frameColor",
            ConfigField::LaserColor => "laserColor",
            ConfigField::OnOrientationChange => "onOrientationChange",
            ConfigField::OnZoom => "onZoom",
            ConfigField::ResetFocusTimeout => "resetFocusTimeout",
            ConfigField::ResetFocusWhenMotionDetected => "resetFocusWhenMotionDetected",
            ConfigField::FocusMode => "focusMode",
            ConfigField::ZoomMode => "zoomMode",
            ConfigField::Zoom => "zoom",
            ConfigField::MaxZoom => "maxZoom",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownField(s.to_string()))
    }
}

/// Set of fields that changed in one delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangedFields(BTreeSet<ConfigField>);

impl ChangedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field; what the host sends on its first delivery.
    pub fn all() -> Self {
        ConfigField::ALL.into_iter().collect()
    }

    /// Parses host property names, ignoring ones this crate does not know.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names
            .into_iter()
            .filter_map(|name| match name.parse() {
                Ok(field) => Some(field),
                Err(_) => {
                    tracing::trace!(name, "Ignoring unrecognized property");
                    None
                }
            })
            .collect()
    }

    pub fn insert(&mut self, field: ConfigField) -> bool {
        self.0.insert(field)
    }

    #[inline]
    pub fn contains(&self, field: ConfigField) -> bool {
        self.0.contains(&field)
    }

    /// Returns true if any of `fields` changed.
    pub fn contains_any(&self, fields: &[ConfigField]) -> bool {
        fields.iter().any(|f| self.0.contains(f))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ConfigField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ConfigField> for ChangedFields {
    fn from_iter<I: IntoIterator<Item = ConfigField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[ConfigField; N]> for ChangedFields {
    fn from(fields: [ConfigField; N]) -> Self {
        fields.into_iter().collect()
    }
}

/// RGBA colour parsed from `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const RED: Color = Color::rgb(0xFF, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 0xFF },
        })
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 0xFF {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}
