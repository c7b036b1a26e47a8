//! Entity registry port: stable entity ids for unique ids.

use std::future::Future;

use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::id::{DeviceId, LinkId};

/// Registration request for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Entity domain (`light`, `switch`).
    pub domain: String,
    /// Integration providing the entity.
    pub platform: String,
    pub unique_id: String,
    /// Name the entity id is derived from on first registration.
    pub suggested_name: String,
    pub config_entry_id: Option<LinkId>,
    pub device_id: Option<DeviceId>,
}

/// Maps unique ids to entity ids and remembers which config entry owns them.
pub trait EntityRegistry: Send + Sync {
    /// Register an entity, returning its entity id.
    ///
    /// Registering a unique id again returns the entity id assigned the
    /// first time.
    fn register(
        &self,
        entry: RegistryEntry,
    ) -> impl Future<Output = Result<String, MitmLightError>> + Send;

    /// Entity id registered for `unique_id`, if any.
    fn find_by_unique_id(
        &self,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<String>, MitmLightError>> + Send;

    /// Forget every entity owned by a config entry, returning their entity ids.
    fn remove_config_entry(
        &self,
        entry_id: LinkId,
    ) -> impl Future<Output = Result<Vec<String>, MitmLightError>> + Send;
}
