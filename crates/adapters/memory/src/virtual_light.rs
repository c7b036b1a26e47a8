//! Virtual light: a simulated target responding to `turn_on`, `turn_off`
//! and `toggle` with full light attributes.

use std::collections::BTreeSet;

use mitmlight_domain::device::Device;
use mitmlight_domain::entity::{Entity, EntityState};
use mitmlight_domain::error::{MitmLightError, ValidationError};
use mitmlight_domain::light::{
    LightCapabilities, LightFeatures, LightState, TurnOffParams, TurnOnParams,
};
use mitmlight_domain::service::{SERVICE_TOGGLE, SERVICE_TURN_OFF, SERVICE_TURN_ON, ServiceCall};

use crate::config::VirtualLightConfig;

/// A simulated light with configurable capabilities.
#[derive(Debug, Clone)]
pub struct VirtualLight {
    device: Device,
    entity_id: String,
    name: String,
    capabilities: LightCapabilities,
    state: LightState,
}

impl VirtualLight {
    /// Build a light from its configuration, switched off.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name or entity id is invalid.
    pub fn from_config(config: &VirtualLightConfig) -> Result<Self, MitmLightError> {
        let device = Device::new(&config.name)?.with_model(&config.manufacturer, &config.model);

        let mut capabilities = LightCapabilities {
            supported_features: LightFeatures::from_bits(config.supported_features),
            min_color_temp_kelvin: config.min_color_temp_kelvin,
            max_color_temp_kelvin: config.max_color_temp_kelvin,
            effect_list: config.effect_list.clone(),
            ..LightCapabilities::default()
        };
        if !config.supported_color_modes.is_empty() {
            capabilities.supported_color_modes =
                config.supported_color_modes.iter().copied().collect::<BTreeSet<_>>();
        }

        let state = LightState {
            color_mode: capabilities.supported_color_modes.first().copied(),
            ..LightState::default()
        };

        let light = Self {
            device,
            entity_id: config.entity_id.clone(),
            name: config.name.clone(),
            capabilities,
            state,
        };
        light.snapshot()?;
        Ok(light)
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[must_use]
    pub fn state(&self) -> &LightState {
        &self.state
    }

    /// Entity as published to the state machine.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the entity id is malformed.
    pub fn snapshot(&self) -> Result<Entity, MitmLightError> {
        let mut entity = Entity::builder()
            .entity_id(&self.entity_id)
            .device_id(Some(self.device.id))
            .friendly_name(&self.name)
            .state(EntityState::from(self.state.is_on))
            .build()?;
        self.capabilities.write_attributes(&mut entity.attributes);
        self.state.write_attributes(&mut entity.attributes);
        Ok(entity)
    }

    /// Handle a service call, returning the updated entity snapshot.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed data or an unknown service.
    pub fn handle_service(&mut self, call: &ServiceCall) -> Result<Entity, MitmLightError> {
        match call.service.as_str() {
            SERVICE_TURN_ON => {
                let params = TurnOnParams::from_service_data(&call.data)?;
                self.state.apply_turn_on(&params);
            }
            SERVICE_TURN_OFF => {
                TurnOffParams::from_service_data(&call.data)?;
                self.state.turn_off();
            }
            SERVICE_TOGGLE => {
                if self.state.is_on {
                    self.state.turn_off();
                } else {
                    let params = TurnOnParams::from_service_data(&call.data)?;
                    self.state.apply_turn_on(&params);
                }
            }
            other => {
                return Err(ValidationError::UnsupportedService {
                    domain: call.domain.clone(),
                    service: other.to_string(),
                }
                .into());
            }
        }
        self.snapshot()
    }
}
