//! State store port: the host's state machine.

use std::future::Future;

use mitmlight_domain::entity::Entity;
use mitmlight_domain::error::MitmLightError;

/// Current state of every entity, keyed by `entity_id`.
pub trait StateStore: Send + Sync {
    /// Current state of an entity, `None` when it has none (yet).
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, MitmLightError>> + Send;

    /// Write an entity's state.
    ///
    /// Observers are notified with a state-changed event when the state or
    /// the attributes differ from the stored ones.
    fn set_state(&self, entity: Entity) -> impl Future<Output = Result<(), MitmLightError>> + Send;

    /// Drop an entity's state, returning the last one.
    fn remove_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, MitmLightError>> + Send;
}
