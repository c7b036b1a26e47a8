//! Staged state of a proxy light.

use std::collections::HashMap;

use crate::entity::AttributeValue;

use super::{
    ATTR_BRIGHTNESS, ATTR_COLOR_MODE, ATTR_EFFECT, ATTR_WHITE, Color, ColorMode, LightCommand,
    TurnOffParams, TurnOnParams,
};

/// On/off, brightness, one color representation and the rest of the
/// attributes a proxy forwards to its target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightState {
    pub is_on: bool,
    pub brightness: Option<u8>,
    pub color: Option<Color>,
    pub color_mode: Option<ColorMode>,
    pub effect: Option<String>,
    pub white: Option<u8>,
}

impl LightState {
    /// Apply `turn_on` parameters.
    ///
    /// A given color replaces the current one and sets the matching mode.
    /// Without a color, a light that has no mode yet becomes
    /// [`ColorMode::Brightness`] when a brightness is given and
    /// [`ColorMode::OnOff`] otherwise.
    pub fn apply_turn_on(&mut self, params: &TurnOnParams) {
        self.is_on = true;

        if let Some(brightness) = params.brightness {
            self.brightness = Some(brightness);
        }

        if let Some(color) = params.color {
            self.color = Some(color);
            self.color_mode = Some(color.mode());
        } else if self.color_mode.is_none() {
            self.color_mode = Some(if params.brightness.is_some() {
                ColorMode::Brightness
            } else {
                ColorMode::OnOff
            });
        }

        if let Some(effect) = &params.effect {
            self.effect = Some(effect.clone());
        }
        if let Some(white) = params.white {
            self.white = Some(white);
        }
    }

    pub fn turn_off(&mut self) {
        self.is_on = false;
    }

    /// The command that reproduces this whole state on another light.
    ///
    /// No transition is attached.
    #[must_use]
    pub fn to_command(&self) -> LightCommand {
        if self.is_on {
            LightCommand::TurnOn(TurnOnParams {
                brightness: self.brightness,
                color: self.color,
                effect: self.effect.clone(),
                white: self.white,
                transition: None,
            })
        } else {
            LightCommand::TurnOff(TurnOffParams::default())
        }
    }

    /// State attributes; only reported while the light is on.
    pub fn write_attributes(&self, attributes: &mut HashMap<String, AttributeValue>) {
        if !self.is_on {
            return;
        }
        if let Some(mode) = self.color_mode {
            attributes.insert(ATTR_COLOR_MODE.to_string(), mode.as_str().into());
        }
        if let Some(brightness) = self.brightness {
            attributes.insert(ATTR_BRIGHTNESS.to_string(), i64::from(brightness).into());
        }
        if let Some(color) = &self.color {
            attributes.insert(
                color.attribute_key().to_string(),
                AttributeValue::from(color.to_json()),
            );
        }
        if let Some(effect) = &self.effect {
            attributes.insert(ATTR_EFFECT.to_string(), effect.as_str().into());
        }
        if let Some(white) = self.white {
            attributes.insert(ATTR_WHITE.to_string(), i64::from(white).into());
        }
    }
}
