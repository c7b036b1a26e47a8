//! Capability snapshot of a light: what it can do, not what it is doing.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::entity::{AttributeValue, Entity};

use super::{
    ATTR_COLOR_MODE, ATTR_EFFECT_LIST, ATTR_MAX_COLOR_TEMP_KELVIN, ATTR_MIN_COLOR_TEMP_KELVIN,
    ATTR_SUPPORTED_COLOR_MODES, ATTR_SUPPORTED_FEATURES, ColorMode,
};

/// Bitmask of optional light features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LightFeatures(u32);

impl LightFeatures {
    pub const EFFECT: Self = Self(4);
    pub const FLASH: Self = Self(8);
    pub const TRANSITION: Self = Self(32);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for LightFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Supported color modes, features, color-temperature range and effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightCapabilities {
    pub supported_color_modes: BTreeSet<ColorMode>,
    pub supported_features: LightFeatures,
    pub min_color_temp_kelvin: Option<u32>,
    pub max_color_temp_kelvin: Option<u32>,
    pub effect_list: Option<Vec<String>>,
}

impl Default for LightCapabilities {
    /// On/off only, no features.
    fn default() -> Self {
        Self {
            supported_color_modes: BTreeSet::from([ColorMode::OnOff]),
            supported_features: LightFeatures::default(),
            min_color_temp_kelvin: None,
            max_color_temp_kelvin: None,
            effect_list: None,
        }
    }
}

impl LightCapabilities {
    #[must_use]
    pub fn supports(&self, mode: ColorMode) -> bool {
        self.supported_color_modes.contains(&mode)
    }

    /// Whether this is still the on/off-only fallback.
    #[must_use]
    pub fn is_minimal(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay capabilities found in a previously persisted snapshot.
    ///
    /// Returns `true` when the snapshot carried real capabilities: color
    /// modes other than a lone `onoff`, or a non-zero feature mask. The
    /// color-temperature range (when both bounds are present) and the
    /// effect list are taken along but do not count on their own.
    pub fn restore_from(&mut self, last: &Entity) -> bool {
        let mut restored = false;

        let modes = color_modes(&last.attributes);
        if !modes.is_empty() && modes != BTreeSet::from([ColorMode::OnOff]) {
            self.supported_color_modes = modes;
            restored = true;
        }

        if let Some(bits) = features(&last.attributes).filter(|f| !f.is_empty()) {
            self.supported_features = bits;
            restored = true;
        }

        let min = kelvin(&last.attributes, ATTR_MIN_COLOR_TEMP_KELVIN);
        let max = kelvin(&last.attributes, ATTR_MAX_COLOR_TEMP_KELVIN);
        if min.is_some() && max.is_some() {
            self.min_color_temp_kelvin = min;
            self.max_color_temp_kelvin = max;
        }

        if let Some(effects) = effect_list(&last.attributes) {
            self.effect_list = Some(effects);
        }

        restored
    }

    /// Copy capabilities from the target light's current state.
    ///
    /// Returns the color mode the proxy should start in: the target's
    /// current mode, or else the first supported one.
    pub fn copy_from(&mut self, target: &Entity) -> Option<ColorMode> {
        let modes = color_modes(&target.attributes);
        if !modes.is_empty() {
            self.supported_color_modes = modes;
        }

        let current_mode = target
            .get_attribute(ATTR_COLOR_MODE)
            .and_then(AttributeValue::as_str)
            .and_then(|mode| mode.parse().ok())
            .or_else(|| self.supported_color_modes.first().copied());

        self.supported_features = features(&target.attributes).unwrap_or_default();

        if self.supports(ColorMode::ColorTemp) {
            self.min_color_temp_kelvin = kelvin(&target.attributes, ATTR_MIN_COLOR_TEMP_KELVIN);
            self.max_color_temp_kelvin = kelvin(&target.attributes, ATTR_MAX_COLOR_TEMP_KELVIN);
        }

        if let Some(effects) = effect_list(&target.attributes) {
            self.effect_list = Some(effects);
        }

        current_mode
    }

    /// Capability attributes, always reported.
    pub fn write_attributes(&self, attributes: &mut HashMap<String, AttributeValue>) {
        let modes: Vec<&str> = self
            .supported_color_modes
            .iter()
            .map(|mode| mode.as_str())
            .collect();
        attributes.insert(
            ATTR_SUPPORTED_COLOR_MODES.to_string(),
            AttributeValue::Json(serde_json::json!(modes)),
        );
        attributes.insert(
            ATTR_SUPPORTED_FEATURES.to_string(),
            i64::from(self.supported_features.bits()).into(),
        );
        if let Some(min) = self.min_color_temp_kelvin {
            attributes.insert(ATTR_MIN_COLOR_TEMP_KELVIN.to_string(), i64::from(min).into());
        }
        if let Some(max) = self.max_color_temp_kelvin {
            attributes.insert(ATTR_MAX_COLOR_TEMP_KELVIN.to_string(), i64::from(max).into());
        }
        if let Some(effects) = &self.effect_list {
            attributes.insert(
                ATTR_EFFECT_LIST.to_string(),
                AttributeValue::Json(serde_json::json!(effects)),
            );
        }
    }
}

fn color_modes(attributes: &HashMap<String, AttributeValue>) -> BTreeSet<ColorMode> {
    attributes
        .get(ATTR_SUPPORTED_COLOR_MODES)
        .and_then(AttributeValue::decode::<Vec<String>>)
        .unwrap_or_default()
        .iter()
        .filter_map(|mode| mode.parse().ok())
        .collect()
}

fn features(attributes: &HashMap<String, AttributeValue>) -> Option<LightFeatures> {
    attributes
        .get(ATTR_SUPPORTED_FEATURES)
        .and_then(AttributeValue::as_int)
        .and_then(|bits| u32::try_from(bits).ok())
        .map(LightFeatures::from_bits)
}

fn kelvin(attributes: &HashMap<String, AttributeValue>, key: &str) -> Option<u32> {
    attributes
        .get(key)
        .and_then(AttributeValue::as_int)
        .and_then(|k| u32::try_from(k).ok())
        .filter(|k| *k > 0)
}

fn effect_list(attributes: &HashMap<String, AttributeValue>) -> Option<Vec<String>> {
    attributes
        .get(ATTR_EFFECT_LIST)
        .and_then(AttributeValue::decode::<Vec<String>>)
        .filter(|effects| !effects.is_empty())
}
