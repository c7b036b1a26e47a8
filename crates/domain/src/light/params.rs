//! `turn_on` / `turn_off` parameters and their service-data encoding.

use serde::{Deserialize, Serialize};

use crate::error::{MitmLightError, ValidationError};
use crate::service::{SERVICE_TURN_OFF, SERVICE_TURN_ON};

use super::Color;

type ServiceData = serde_json::Map<String, serde_json::Value>;

/// Wire shape of `light.turn_on` data. Unknown keys are ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TurnOnData {
    #[serde(skip_serializing_if = "Option::is_none")]
    brightness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hs_color: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rgb_color: Option<[u8; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rgbw_color: Option<[u8; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rgbww_color: Option<[u8; 5]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xy_color: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_temp_kelvin: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    effect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    white: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transition: Option<f64>,
}

impl TurnOnData {
    fn colors(&self) -> Vec<Color> {
        [
            self.hs_color.map(|(h, s)| Color::Hs(h, s)),
            self.rgb_color.map(Color::Rgb),
            self.rgbw_color.map(Color::Rgbw),
            self.rgbww_color.map(Color::Rgbww),
            self.xy_color.map(|(x, y)| Color::Xy(x, y)),
            self.color_temp_kelvin.map(Color::ColorTemp),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Attributes passed to a light's `turn_on`.
///
/// Every field is optional; only the fields that are set travel to the
/// target when the call is forwarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOnParams {
    pub brightness: Option<u8>,
    pub color: Option<Color>,
    pub effect: Option<String>,
    pub white: Option<u8>,
    /// Transition duration in seconds.
    pub transition: Option<f64>,
}

impl TurnOnParams {
    /// Parse service data.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidServiceData`] when a field has the
    /// wrong shape, or [`ValidationError::MultipleColors`] when more than one
    /// color representation is given.
    pub fn from_service_data(data: &ServiceData) -> Result<Self, MitmLightError> {
        let raw: TurnOnData = serde_json::from_value(serde_json::Value::Object(data.clone()))
            .map_err(ValidationError::InvalidServiceData)?;
        let colors = raw.colors();
        if colors.len() > 1 {
            return Err(ValidationError::MultipleColors(colors.len()).into());
        }
        Ok(Self {
            brightness: raw.brightness,
            color: colors.into_iter().next(),
            effect: raw.effect,
            white: raw.white,
            transition: raw.transition,
        })
    }

    /// Encode only the fields that are set.
    #[must_use]
    pub fn to_service_data(&self) -> ServiceData {
        let mut raw = TurnOnData {
            brightness: self.brightness,
            effect: self.effect.clone(),
            white: self.white,
            transition: self.transition,
            ..TurnOnData::default()
        };
        match self.color {
            Some(Color::Hs(h, s)) => raw.hs_color = Some((h, s)),
            Some(Color::Rgb(c)) => raw.rgb_color = Some(c),
            Some(Color::Rgbw(c)) => raw.rgbw_color = Some(c),
            Some(Color::Rgbww(c)) => raw.rgbww_color = Some(c),
            Some(Color::Xy(x, y)) => raw.xy_color = Some((x, y)),
            Some(Color::ColorTemp(k)) => raw.color_temp_kelvin = Some(k),
            None => {}
        }
        match serde_json::to_value(raw) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => ServiceData::new(),
        }
    }
}

/// Attributes passed to a light's `turn_off`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnOffParams {
    /// Transition duration in seconds.
    pub transition: Option<f64>,
}

#[derive(Deserialize)]
struct TurnOffData {
    transition: Option<f64>,
}

impl TurnOffParams {
    /// Parse service data, keeping only the transition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidServiceData`] when `transition` is
    /// not a number.
    pub fn from_service_data(data: &ServiceData) -> Result<Self, MitmLightError> {
        let raw: TurnOffData = serde_json::from_value(serde_json::Value::Object(data.clone()))
            .map_err(ValidationError::InvalidServiceData)?;
        Ok(Self {
            transition: raw.transition,
        })
    }

    #[must_use]
    pub fn to_service_data(&self) -> ServiceData {
        let mut data = ServiceData::new();
        if let Some(transition) = self.transition {
            data.insert(super::ATTR_TRANSITION.to_string(), transition.into());
        }
        data
    }
}

/// A command to send to a light.
#[derive(Debug, Clone, PartialEq)]
pub enum LightCommand {
    TurnOn(TurnOnParams),
    TurnOff(TurnOffParams),
}

impl LightCommand {
    #[must_use]
    pub fn service(&self) -> &'static str {
        match self {
            Self::TurnOn(_) => SERVICE_TURN_ON,
            Self::TurnOff(_) => SERVICE_TURN_OFF,
        }
    }

    #[must_use]
    pub fn service_data(&self) -> ServiceData {
        match self {
            Self::TurnOn(params) => params.to_service_data(),
            Self::TurnOff(params) => params.to_service_data(),
        }
    }
}
