//! Active proxy selection.
//!
//! Which proxy drives the target is derived from the toggle switch's
//! current state alone. Both proxies ask the same selector instead of
//! reading and comparing the toggle themselves.

use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::link::ProxyVariant;

use crate::ports::{EntityRegistry, StateStore};

/// Answers "which proxy is active right now".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveProxySelector {
    toggle_entity_id: Option<String>,
}

impl ActiveProxySelector {
    /// Look the toggle up by its unique id.
    ///
    /// When the toggle is not registered the selector stays unresolved and
    /// never reports an active proxy.
    ///
    /// # Errors
    ///
    /// Propagates registry failures.
    pub async fn resolve<R>(
        registry: &R,
        toggle_unique_id: &str,
        requester: &str,
    ) -> Result<Self, MitmLightError>
    where
        R: EntityRegistry + ?Sized,
    {
        let toggle_entity_id = registry.find_by_unique_id(toggle_unique_id).await?;
        match &toggle_entity_id {
            Some(entity_id) => {
                tracing::debug!(%entity_id, light = requester, "found overridden switch entity");
            }
            None => {
                tracing::warn!(
                    unique_id = toggle_unique_id,
                    light = requester,
                    "could not find overridden switch entity"
                );
            }
        }
        Ok(Self { toggle_entity_id })
    }

    #[must_use]
    pub fn toggle_entity_id(&self) -> Option<&str> {
        self.toggle_entity_id.as_deref()
    }

    /// The active variant, `None` while the toggle is unknown or has no state.
    ///
    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn active_variant<S>(&self, states: &S) -> Result<Option<ProxyVariant>, MitmLightError>
    where
        S: StateStore + ?Sized,
    {
        let Some(entity_id) = self.toggle_entity_id.as_deref() else {
            return Ok(None);
        };
        let toggle = states.get_state(entity_id).await?;
        Ok(toggle.map(|toggle| ProxyVariant::active_for(toggle.is_on())))
    }

    /// Whether `variant` is the active one.
    ///
    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn is_active<S>(&self, variant: ProxyVariant, states: &S) -> Result<bool, MitmLightError>
    where
        S: StateStore + ?Sized,
    {
        Ok(self.active_variant(states).await? == Some(variant))
    }
}
