//! Link runtime: the three entities of one config entry.

use std::sync::Arc;

use mitmlight_domain::error::{MitmLightError, NotFoundError, ValidationError};
use mitmlight_domain::id::LinkId;
use mitmlight_domain::light::{TurnOffParams, TurnOnParams};
use mitmlight_domain::link::{ConfigEntry, LinkConfig, ProxyVariant};
use mitmlight_domain::service::{SERVICE_TOGGLE, SERVICE_TURN_OFF, SERVICE_TURN_ON, ServiceCall};

use crate::entities::{ProxyLight, ToggleSwitch};
use crate::ports::Host;

/// A set-up config entry: toggle switch, primary and override proxies.
pub struct Link<H> {
    config: LinkConfig,
    toggle: ToggleSwitch<H>,
    primary: ProxyLight<H>,
    secondary: ProxyLight<H>,
}

impl<H: Host> Link<H> {
    /// Create the link's entities.
    ///
    /// The toggle is added before the proxies so they can find it. A target
    /// light that is missing or unavailable is only reported; proxies that
    /// cannot copy from it start with on/off-only capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::Config`] when the entry names no usable
    /// target, or propagates host failures.
    #[tracing::instrument(skip(host, entry), fields(entry_id = %entry.entry_id))]
    pub async fn setup(host: Arc<H>, entry: &ConfigEntry) -> Result<Self, MitmLightError> {
        let config = LinkConfig::from_entry(entry)?;

        let target = host.get_state(&config.target_entity_id).await?;
        if target.is_none_or(|target| !target.state.is_available()) {
            tracing::warn!(
                source = %config.target_entity_id,
                "source light not available yet, setting up anyway"
            );
        }

        let toggle = ToggleSwitch::add(Arc::clone(&host), &config).await?;
        let primary = ProxyLight::add(Arc::clone(&host), &config, ProxyVariant::Primary).await?;
        let secondary = ProxyLight::add(host, &config, ProxyVariant::Override).await?;

        tracing::info!(
            title = %config.title,
            source = %config.target_entity_id,
            "link set up"
        );
        Ok(Self {
            config,
            toggle,
            primary,
            secondary,
        })
    }

    #[must_use]
    pub fn entry_id(&self) -> LinkId {
        self.config.entry_id
    }

    #[must_use]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    #[must_use]
    pub fn toggle(&self) -> &ToggleSwitch<H> {
        &self.toggle
    }

    #[must_use]
    pub fn proxy(&self, variant: ProxyVariant) -> &ProxyLight<H> {
        match variant {
            ProxyVariant::Primary => &self.primary,
            ProxyVariant::Override => &self.secondary,
        }
    }

    /// Entity ids of the toggle, the primary and the override proxy.
    #[must_use]
    pub fn entity_ids(&self) -> [&str; 3] {
        [
            self.toggle.entity_id(),
            self.primary.entity_id(),
            self.secondary.entity_id(),
        ]
    }

    #[must_use]
    pub fn owns_entity(&self, entity_id: &str) -> bool {
        self.entity_ids().contains(&entity_id)
    }

    /// Route `turn_on`, `turn_off` or `toggle` to the addressed entity.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::NotFound`] for an entity of another link,
    /// [`MitmLightError::Validation`] for an unknown service or malformed
    /// data, or propagates host failures.
    pub async fn handle_service_call(&mut self, call: &ServiceCall) -> Result<(), MitmLightError> {
        if call.entity_id == self.toggle.entity_id() {
            return match call.service.as_str() {
                SERVICE_TURN_ON => self.toggle.turn_on().await,
                SERVICE_TURN_OFF => self.toggle.turn_off().await,
                SERVICE_TOGGLE => self.toggle.toggle().await,
                _ => Err(unsupported(call)),
            };
        }

        let proxy = if call.entity_id == self.primary.entity_id() {
            &mut self.primary
        } else if call.entity_id == self.secondary.entity_id() {
            &mut self.secondary
        } else {
            return Err(NotFoundError {
                entity: "Entity",
                id: call.entity_id.clone(),
            }
            .into());
        };

        match call.service.as_str() {
            SERVICE_TURN_ON => {
                proxy
                    .turn_on(TurnOnParams::from_service_data(&call.data)?)
                    .await
            }
            SERVICE_TURN_OFF => {
                proxy
                    .turn_off(TurnOffParams::from_service_data(&call.data)?)
                    .await
            }
            SERVICE_TOGGLE => {
                proxy
                    .toggle(TurnOnParams::from_service_data(&call.data)?)
                    .await
            }
            _ => Err(unsupported(call)),
        }
    }

    /// Let both proxies react to toggle changes published so far.
    pub async fn process_pending_events(&mut self) -> usize {
        self.primary.process_pending_events().await + self.secondary.process_pending_events().await
    }

    /// Save every entity's last state and remove them from the host.
    ///
    /// # Errors
    ///
    /// Propagates host failures.
    #[tracing::instrument(skip(self), fields(entry_id = %self.config.entry_id))]
    pub async fn unload(mut self) -> Result<(), MitmLightError> {
        self.toggle.remove_from_host().await?;
        self.primary.remove_from_host().await?;
        self.secondary.remove_from_host().await?;
        tracing::info!(title = %self.config.title, "link unloaded");
        Ok(())
    }
}

fn unsupported(call: &ServiceCall) -> MitmLightError {
    ValidationError::UnsupportedService {
        domain: call.domain.clone(),
        service: call.service.clone(),
    }
    .into()
}
