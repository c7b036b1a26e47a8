//! Light model: color modes, colors, capabilities and commands.
//!
//! Attribute keys follow the host's light platform so snapshots written by
//! the proxies and read from the target share one vocabulary.

mod capabilities;
mod color;
mod params;
mod state;

pub use capabilities::{LightCapabilities, LightFeatures};
pub use color::{Color, ColorMode};
pub use params::{LightCommand, TurnOffParams, TurnOnParams};
pub use state::LightState;

/// Entity domain of lights.
pub const LIGHT_DOMAIN: &str = "light";

pub const ATTR_BRIGHTNESS: &str = "brightness";
pub const ATTR_COLOR_MODE: &str = "color_mode";
pub const ATTR_HS_COLOR: &str = "hs_color";
pub const ATTR_RGB_COLOR: &str = "rgb_color";
pub const ATTR_RGBW_COLOR: &str = "rgbw_color";
pub const ATTR_RGBWW_COLOR: &str = "rgbww_color";
pub const ATTR_XY_COLOR: &str = "xy_color";
pub const ATTR_COLOR_TEMP_KELVIN: &str = "color_temp_kelvin";
pub const ATTR_EFFECT: &str = "effect";
pub const ATTR_WHITE: &str = "white";
pub const ATTR_TRANSITION: &str = "transition";

pub const ATTR_SUPPORTED_COLOR_MODES: &str = "supported_color_modes";
pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";
pub const ATTR_MIN_COLOR_TEMP_KELVIN: &str = "min_color_temp_kelvin";
pub const ATTR_MAX_COLOR_TEMP_KELVIN: &str = "max_color_temp_kelvin";
pub const ATTR_EFFECT_LIST: &str = "effect_list";
