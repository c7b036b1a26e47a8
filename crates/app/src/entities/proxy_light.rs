//! Proxy light: a staged copy of the target light.
//!
//! Each link has two of them. Both accept commands at all times; only the
//! active one (as reported by the [`ActiveProxySelector`]) forwards to the
//! target. Ordinary commands forward exactly the attributes they carry,
//! while becoming active forwards the proxy's whole state at once.

use std::sync::Arc;

use mitmlight_domain::entity::{Entity, EntityState};
use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::event::Event;
use mitmlight_domain::id::DeviceId;
use mitmlight_domain::light::{
    LIGHT_DOMAIN, LightCapabilities, LightCommand, LightState, TurnOffParams, TurnOnParams,
};
use mitmlight_domain::link::{INTEGRATION_DOMAIN, LinkConfig, ProxyVariant, SUFFIX_OVERRIDDEN};
use mitmlight_domain::service::ServiceCall;

use crate::event_bus::{StateChangeSubscription, track_state_change};
use crate::ports::{Host, RegistryEntry};
use crate::selector::ActiveProxySelector;

/// One of the two proxies of a link.
pub struct ProxyLight<H> {
    host: Arc<H>,
    variant: ProxyVariant,
    entity_id: String,
    unique_id: String,
    name: String,
    target_entity_id: String,
    device_id: Option<DeviceId>,
    capabilities: LightCapabilities,
    state: LightState,
    selector: ActiveProxySelector,
    toggle_events: Option<StateChangeSubscription>,
}

impl<H: Host> ProxyLight<H> {
    /// Register the proxy, settle its capabilities and start tracking the
    /// link's toggle switch.
    ///
    /// Capabilities come from the last saved state when it carries real
    /// ones, otherwise from the target's current state. A target that is
    /// missing or unavailable leaves the proxy on/off only. The toggle switch must have been
    /// added first; when it cannot be found the proxy never forwards.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    pub async fn add(
        host: Arc<H>,
        config: &LinkConfig,
        variant: ProxyVariant,
    ) -> Result<Self, MitmLightError> {
        let unique_id = config.unique_id(variant.suffix());
        let name = config.entity_name(variant.suffix());
        let device_id = super::target_device(&*host, &config.target_entity_id).await?;

        let entity_id = host
            .register(RegistryEntry {
                domain: LIGHT_DOMAIN.to_string(),
                platform: INTEGRATION_DOMAIN.to_string(),
                unique_id: unique_id.clone(),
                suggested_name: name.clone(),
                config_entry_id: Some(config.entry_id),
                device_id,
            })
            .await?;

        let mut light = Self {
            host: Arc::clone(&host),
            variant,
            entity_id,
            unique_id,
            name,
            target_entity_id: config.target_entity_id.clone(),
            device_id,
            capabilities: LightCapabilities::default(),
            state: LightState::default(),
            selector: ActiveProxySelector::default(),
            toggle_events: None,
        };

        light.settle_capabilities().await?;

        light.selector = ActiveProxySelector::resolve(
            &*host,
            &config.unique_id(SUFFIX_OVERRIDDEN),
            &light.name,
        )
        .await?;
        match light.selector.toggle_entity_id() {
            Some(toggle) => {
                tracing::debug!(light = %light.name, %toggle, "tracking switch for state changes");
                light.toggle_events = Some(track_state_change(&*host, [toggle]));
            }
            None => {
                tracing::error!(light = %light.name, "could not find switch entity to track");
            }
        }

        light.write_state().await?;
        Ok(light)
    }

    async fn settle_capabilities(&mut self) -> Result<(), MitmLightError> {
        if let Some(last) = self.host.last_state(&self.entity_id).await? {
            tracing::debug!(light = %self.name, "attempting to restore capabilities from previous state");
            if self.capabilities.restore_from(&last) {
                tracing::info!(
                    light = %self.name,
                    modes = ?self.capabilities.supported_color_modes,
                    features = self.capabilities.supported_features.bits(),
                    "restored capabilities from state"
                );
                return Ok(());
            }
        }

        tracing::debug!(
            light = %self.name,
            source = %self.target_entity_id,
            "no saved capabilities, copying from source light"
        );
        let target = self.host.get_state(&self.target_entity_id).await?;
        match target.filter(|target| target.state.is_available()) {
            Some(target) => {
                self.state.color_mode = self.capabilities.copy_from(&target);
                tracing::debug!(
                    light = %self.name,
                    modes = ?self.capabilities.supported_color_modes,
                    "copied capabilities from source light"
                );
            }
            None => {
                tracing::warn!(
                    source = %self.target_entity_id,
                    "could not get source light state to copy capabilities"
                );
            }
        }
        Ok(())
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
    pub fn variant(&self) -> ProxyVariant {
        self.variant
    }

    #[must_use]
    pub fn state(&self) -> &LightState {
        &self.state
    }

    #[must_use]
    pub fn capabilities(&self) -> &LightCapabilities {
        &self.capabilities
    }

    /// Apply `turn_on` and, while active, forward exactly `params` to the
    /// target.
    ///
    /// # Errors
    ///
    /// Propagates state store failures. Forwarding failures are only logged.
    #[tracing::instrument(skip(self), fields(light = %self.name))]
    pub async fn turn_on(&mut self, params: TurnOnParams) -> Result<(), MitmLightError> {
        self.state.apply_turn_on(&params);
        self.write_state().await?;
        if self.is_active().await? {
            self.forward(LightCommand::TurnOn(params)).await;
        }
        Ok(())
    }

    /// Switch off and, while active, forward `turn_off` with the transition
    /// only.
    ///
    /// # Errors
    ///
    /// Propagates state store failures. Forwarding failures are only logged.
    #[tracing::instrument(skip(self), fields(light = %self.name))]
    pub async fn turn_off(&mut self, params: TurnOffParams) -> Result<(), MitmLightError> {
        self.state.turn_off();
        self.write_state().await?;
        if self.is_active().await? {
            self.forward(LightCommand::TurnOff(params)).await;
        }
        Ok(())
    }

    /// `turn_off` when on, `turn_on` otherwise.
    ///
    /// # Errors
    ///
    /// See [`Self::turn_on`] and [`Self::turn_off`].
    pub async fn toggle(&mut self, params: TurnOnParams) -> Result<(), MitmLightError> {
        if self.state.is_on {
            self.turn_off(TurnOffParams {
                transition: params.transition,
            })
            .await
        } else {
            self.turn_on(params).await
        }
    }

    /// React to a state change of the toggle switch.
    ///
    /// Pushes the whole state to the target when this proxy goes from
    /// inactive to active. Removal events are ignored.
    pub async fn handle_toggle_event(&self, event: &Event) {
        let Some(new_state) = &event.new_state else {
            return;
        };
        let overridden = new_state.is_on();
        tracing::debug!(
            light = %self.name,
            overridden,
            variant = ?self.variant,
            "received switch change event"
        );

        if !self.variant.is_active_when(overridden) {
            return;
        }
        let was_active = event
            .old_state
            .as_ref()
            .is_some_and(|old| self.variant.is_active_when(old.is_on()));
        if was_active {
            return;
        }

        tracing::info!(
            light = %self.name,
            source = %self.target_entity_id,
            "became active, syncing state to source light"
        );
        self.sync_to_target().await;
    }

    /// Handle every toggle event received so far, returning how many.
    pub async fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self
            .toggle_events
            .as_mut()
            .and_then(StateChangeSubscription::try_next)
        {
            self.handle_toggle_event(&event).await;
            handled += 1;
        }
        handled
    }

    /// Push the complete current state to the target.
    pub async fn sync_to_target(&self) {
        self.forward(self.state.to_command()).await;
    }

    /// Current state as the host should see it: capabilities always, light
    /// attributes while on.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the registry handed out a malformed
    /// entity id.
    pub fn snapshot(&self) -> Result<Entity, MitmLightError> {
        let mut entity = Entity::builder()
            .entity_id(&self.entity_id)
            .unique_id(&self.unique_id)
            .device_id(self.device_id)
            .friendly_name(&self.name)
            .state(EntityState::from(self.state.is_on))
            .build()?;
        self.capabilities.write_attributes(&mut entity.attributes);
        self.state.write_attributes(&mut entity.attributes);
        Ok(entity)
    }

    /// Stop tracking the toggle, remember the last state and drop the live
    /// one from the host.
    ///
    /// # Errors
    ///
    /// Propagates restore store and state store failures.
    pub async fn remove_from_host(&mut self) -> Result<(), MitmLightError> {
        self.toggle_events = None;
        self.host.save_state(self.snapshot()?).await?;
        self.host.remove_state(&self.entity_id).await?;
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, MitmLightError> {
        self.selector.is_active(self.variant, &*self.host).await
    }

    async fn write_state(&self) -> Result<(), MitmLightError> {
        self.host.set_state(self.snapshot()?).await
    }

    async fn forward(&self, command: LightCommand) {
        let call = ServiceCall::new(
            LIGHT_DOMAIN,
            command.service(),
            &self.target_entity_id,
            command.service_data(),
        );
        let service = call.qualified_name();
        if let Err(err) = self.host.call_service(call).await {
            tracing::warn!(
                %err,
                light = %self.name,
                source = %self.target_entity_id,
                %service,
                "failed to forward to source light"
            );
        }
    }
}
