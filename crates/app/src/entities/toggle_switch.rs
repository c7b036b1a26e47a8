//! Toggle switch: selects which proxy drives the target.
//!
//! Off selects the primary proxy, on selects the override proxy. The switch
//! only records and publishes its value; the proxies react to the resulting
//! state-change events.

use std::sync::Arc;

use mitmlight_domain::entity::{Entity, EntityState};
use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::id::DeviceId;
use mitmlight_domain::link::{INTEGRATION_DOMAIN, LinkConfig, SUFFIX_OVERRIDDEN, SWITCH_DOMAIN};

use crate::ports::{Host, RegistryEntry};

/// The "overridden" flag of one link.
pub struct ToggleSwitch<H> {
    host: Arc<H>,
    entity_id: String,
    unique_id: String,
    name: String,
    device_id: Option<DeviceId>,
    is_on: bool,
}

impl<H: Host> ToggleSwitch<H> {
    /// Register the switch and publish its initial (off) state.
    ///
    /// # Errors
    ///
    /// Propagates registry and state store failures.
    pub async fn add(host: Arc<H>, config: &LinkConfig) -> Result<Self, MitmLightError> {
        let unique_id = config.unique_id(SUFFIX_OVERRIDDEN);
        let name = config.entity_name(SUFFIX_OVERRIDDEN);
        let device_id = super::target_device(&*host, &config.target_entity_id).await?;

        let entity_id = host
            .register(RegistryEntry {
                domain: SWITCH_DOMAIN.to_string(),
                platform: INTEGRATION_DOMAIN.to_string(),
                unique_id: unique_id.clone(),
                suggested_name: name.clone(),
                config_entry_id: Some(config.entry_id),
                device_id,
            })
            .await?;

        let switch = Self {
            host,
            entity_id,
            unique_id,
            name,
            device_id,
            is_on: false,
        };
        switch.write_state().await?;
        tracing::debug!(entity_id = %switch.entity_id, "added overridden switch");
        Ok(switch)
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn turn_on(&mut self) -> Result<(), MitmLightError> {
        self.set(true).await
    }

    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn turn_off(&mut self) -> Result<(), MitmLightError> {
        self.set(false).await
    }

    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn toggle(&mut self) -> Result<(), MitmLightError> {
        self.set(!self.is_on).await
    }

    /// Current state as the host should see it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the registry handed out a malformed
    /// entity id.
    pub fn snapshot(&self) -> Result<Entity, MitmLightError> {
        Entity::builder()
            .entity_id(&self.entity_id)
            .unique_id(&self.unique_id)
            .device_id(self.device_id)
            .friendly_name(&self.name)
            .state(EntityState::from(self.is_on))
            .build()
    }

    /// Remember the last state and drop the live one from the host.
    ///
    /// # Errors
    ///
    /// Propagates restore store and state store failures.
    pub async fn remove_from_host(&self) -> Result<(), MitmLightError> {
        self.host.save_state(self.snapshot()?).await?;
        self.host.remove_state(&self.entity_id).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(entity_id = %self.entity_id))]
    async fn set(&mut self, is_on: bool) -> Result<(), MitmLightError> {
        self.is_on = is_on;
        self.write_state().await
    }

    async fn write_state(&self) -> Result<(), MitmLightError> {
        self.host.set_state(self.snapshot()?).await
    }
}
