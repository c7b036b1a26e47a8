//! Color modes and the mutually exclusive color representations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{
    ATTR_COLOR_TEMP_KELVIN, ATTR_HS_COLOR, ATTR_RGB_COLOR, ATTR_RGBW_COLOR, ATTR_RGBWW_COLOR,
    ATTR_XY_COLOR,
};

/// How a light is currently being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "onoff")]
    OnOff,
    #[serde(rename = "brightness")]
    Brightness,
    #[serde(rename = "color_temp")]
    ColorTemp,
    #[serde(rename = "hs")]
    Hs,
    #[serde(rename = "xy")]
    Xy,
    #[serde(rename = "rgb")]
    Rgb,
    #[serde(rename = "rgbw")]
    Rgbw,
    #[serde(rename = "rgbww")]
    Rgbww,
    #[serde(rename = "white")]
    White,
}

impl ColorMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::OnOff => "onoff",
            Self::Brightness => "brightness",
            Self::ColorTemp => "color_temp",
            Self::Hs => "hs",
            Self::Xy => "xy",
            Self::Rgb => "rgb",
            Self::Rgbw => "rgbw",
            Self::Rgbww => "rgbww",
            Self::White => "white",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known color mode.
#[derive(Debug, thiserror::Error)]
#[error("unknown color mode {0:?}")]
pub struct UnknownColorMode(pub String);

impl FromStr for ColorMode {
    type Err = UnknownColorMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "unknown" => Self::Unknown,
            "onoff" => Self::OnOff,
            "brightness" => Self::Brightness,
            "color_temp" => Self::ColorTemp,
            "hs" => Self::Hs,
            "xy" => Self::Xy,
            "rgb" => Self::Rgb,
            "rgbw" => Self::Rgbw,
            "rgbww" => Self::Rgbww,
            "white" => Self::White,
            other => return Err(UnknownColorMode(other.to_string())),
        })
    }
}

/// Exactly one color representation.
///
/// Holding an `Option<Color>` instead of six optional fields makes setting a
/// new representation clear every other one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    /// Hue in degrees, saturation in percent.
    Hs(f64, f64),
    Rgb([u8; 3]),
    Rgbw([u8; 4]),
    Rgbww([u8; 5]),
    Xy(f64, f64),
    /// Color temperature in kelvin.
    ColorTemp(u32),
}

impl Color {
    /// Color mode matching this representation.
    #[must_use]
    pub fn mode(&self) -> ColorMode {
        match self {
            Self::Hs(..) => ColorMode::Hs,
            Self::Rgb(_) => ColorMode::Rgb,
            Self::Rgbw(_) => ColorMode::Rgbw,
            Self::Rgbww(_) => ColorMode::Rgbww,
            Self::Xy(..) => ColorMode::Xy,
            Self::ColorTemp(_) => ColorMode::ColorTemp,
        }
    }

    /// Attribute / service data key carrying this representation.
    #[must_use]
    pub fn attribute_key(&self) -> &'static str {
        match self {
            Self::Hs(..) => ATTR_HS_COLOR,
            Self::Rgb(_) => ATTR_RGB_COLOR,
            Self::Rgbw(_) => ATTR_RGBW_COLOR,
            Self::Rgbww(_) => ATTR_RGBWW_COLOR,
            Self::Xy(..) => ATTR_XY_COLOR,
            Self::ColorTemp(_) => ATTR_COLOR_TEMP_KELVIN,
        }
    }

    /// Wire value: a list for tuples, a number for kelvin.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Hs(h, s) | Self::Xy(h, s) => serde_json::json!([h, s]),
            Self::Rgb(c) => serde_json::json!(c),
            Self::Rgbw(c) => serde_json::json!(c),
            Self::Rgbww(c) => serde_json::json!(c),
            Self::ColorTemp(k) => serde_json::json!(k),
        }
    }
}
