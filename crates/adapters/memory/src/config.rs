//! In-memory host configuration.

use serde::Deserialize;

use mitmlight_domain::light::ColorMode;

/// Configuration for the in-memory host.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryHostConfig {
    /// Capacity of the state-change broadcast channel.
    pub event_bus_capacity: usize,
    /// Virtual lights created at startup.
    #[serde(rename = "light")]
    pub lights: Vec<VirtualLightConfig>,
}

impl Default for MemoryHostConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: 256,
            lights: Vec::new(),
        }
    }
}

/// One simulated light and the capabilities it advertises.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VirtualLightConfig {
    pub entity_id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub supported_color_modes: Vec<ColorMode>,
    /// Feature bitmask (effect = 4, flash = 8, transition = 32).
    pub supported_features: u32,
    pub min_color_temp_kelvin: Option<u32>,
    pub max_color_temp_kelvin: Option<u32>,
    pub effect_list: Option<Vec<String>>,
}

impl Default for VirtualLightConfig {
    fn default() -> Self {
        Self {
            entity_id: "light.virtual_light".to_string(),
            name: "Virtual Light".to_string(),
            manufacturer: "mitmlight".to_string(),
            model: "VLight-1".to_string(),
            supported_color_modes: vec![ColorMode::OnOff],
            supported_features: 0,
            min_color_temp_kelvin: None,
            max_color_temp_kelvin: None,
            effect_list: None,
        }
    }
}
