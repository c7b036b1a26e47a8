//! Restore-state port: last known entity states across restarts.

use std::future::Future;

use mitmlight_domain::entity::Entity;
use mitmlight_domain::error::MitmLightError;

/// Persisted last-known states, keyed by `entity_id`.
pub trait RestoreStateStore: Send + Sync {
    fn last_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, MitmLightError>> + Send;

    fn save_state(&self, entity: Entity)
    -> impl Future<Output = Result<(), MitmLightError>> + Send;

    fn forget_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<(), MitmLightError>> + Send;
}
