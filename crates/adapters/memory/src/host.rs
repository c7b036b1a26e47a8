//! The in-memory host: every port backed by maps behind one mutex.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use mitmlight_app::event_bus::InProcessEventBus;
use mitmlight_app::ports::{
    DeviceRegistry, EntityRegistry, EventPublisher, EventSubscriber, RegistryEntry,
    RestoreStateStore, ServiceCaller, StateStore,
};
use mitmlight_domain::device::Device;
use mitmlight_domain::entity::{Entity, EntityState};
use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::event::Event;
use mitmlight_domain::id::{DeviceId, LinkId};
use mitmlight_domain::light::LIGHT_DOMAIN;
use mitmlight_domain::service::ServiceCall;
use mitmlight_domain::entity::now;

use crate::config::{MemoryHostConfig, VirtualLightConfig};
use crate::error::MemoryHostError;
use crate::registry::{Registry, RegistryRecord};
use crate::virtual_light::VirtualLight;

/// Registry platform of the virtual lights.
pub const VIRTUAL_PLATFORM: &str = "virtual";

#[derive(Default)]
struct Inner {
    states: HashMap<String, Entity>,
    registry: Registry,
    devices: HashMap<DeviceId, Device>,
    restore: HashMap<String, Entity>,
    lights: HashMap<String, VirtualLight>,
    unavailable: HashSet<String>,
    service_calls: Vec<ServiceCall>,
}

/// A complete host kept in memory.
///
/// State writes publish `state_changed` events on an in-process bus,
/// service calls are logged and applied to virtual lights.
pub struct InMemoryHost {
    inner: Mutex<Inner>,
    bus: InProcessEventBus,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new(MemoryHostConfig::default().event_bus_capacity)
    }
}

impl InMemoryHost {
    /// Empty host whose event bus holds `event_bus_capacity` events.
    #[must_use]
    pub fn new(event_bus_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            bus: InProcessEventBus::new(event_bus_capacity),
        }
    }

    /// Host with the configured virtual lights already published.
    ///
    /// # Errors
    ///
    /// Returns an error if a virtual light is invalid or declared twice.
    pub async fn from_config(config: &MemoryHostConfig) -> Result<Self, MitmLightError> {
        let host = Self::new(config.event_bus_capacity);
        for light in &config.lights {
            host.add_virtual_light(light).await?;
        }
        Ok(host)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a virtual light with its device and registry record, and
    /// publish its initial state.
    ///
    /// # Errors
    ///
    /// Returns an error if the light is invalid or its entity id is taken.
    pub async fn add_virtual_light(
        &self,
        config: &VirtualLightConfig,
    ) -> Result<String, MitmLightError> {
        let light = VirtualLight::from_config(config)?;
        let entity_id = light.entity_id().to_string();
        let snapshot = {
            let mut inner = self.lock();
            if inner.lights.contains_key(&entity_id)
                || inner.registry.by_entity_id(&entity_id).is_some()
            {
                return Err(MemoryHostError::DuplicateLight(entity_id).into());
            }
            inner.registry.push_fixed(RegistryRecord {
                entity_id: entity_id.clone(),
                domain: LIGHT_DOMAIN.to_string(),
                platform: VIRTUAL_PLATFORM.to_string(),
                unique_id: entity_id.clone(),
                config_entry_id: None,
                device_id: Some(light.device().id),
            });
            inner.devices.insert(light.device().id, light.device().clone());
            let snapshot = light.snapshot()?;
            inner.lights.insert(entity_id.clone(), light);
            snapshot
        };
        self.set_state(snapshot).await?;
        tracing::debug!(%entity_id, "added virtual light");
        Ok(entity_id)
    }

    /// Mark an entity unavailable: its state becomes `unavailable` and
    /// service calls to it fail.
    ///
    /// # Errors
    ///
    /// Propagates state write failures.
    pub async fn mark_unavailable(&self, entity_id: &str) -> Result<(), MitmLightError> {
        let updated = {
            let mut inner = self.lock();
            inner.unavailable.insert(entity_id.to_string());
            inner.states.get(entity_id).cloned().map(|mut entity| {
                entity.update_state(EntityState::Unavailable, now());
                entity
            })
        };
        if let Some(entity) = updated {
            self.set_state(entity).await?;
        }
        Ok(())
    }

    /// Current state of an entity.
    #[must_use]
    pub fn state(&self, entity_id: &str) -> Option<Entity> {
        self.lock().states.get(entity_id).cloned()
    }

    /// Every service call received so far, in order.
    #[must_use]
    pub fn service_calls(&self) -> Vec<ServiceCall> {
        self.lock().service_calls.clone()
    }

    pub fn clear_service_calls(&self) {
        self.lock().service_calls.clear();
    }

    /// Registry record of an entity.
    #[must_use]
    pub fn registry_record(&self, entity_id: &str) -> Option<RegistryRecord> {
        self.lock().registry.by_entity_id(entity_id).cloned()
    }

    #[must_use]
    pub fn registry_records(&self) -> Vec<RegistryRecord> {
        self.lock().registry.records().to_vec()
    }

    /// Saved last state of an entity.
    #[must_use]
    pub fn saved_state(&self, entity_id: &str) -> Option<Entity> {
        self.lock().restore.get(entity_id).cloned()
    }
}

impl StateStore for InMemoryHost {
    async fn get_state(&self, entity_id: &str) -> Result<Option<Entity>, MitmLightError> {
        Ok(self.state(entity_id))
    }

    async fn set_state(&self, entity: Entity) -> Result<(), MitmLightError> {
        entity.validate()?;
        let (old, changed) = {
            let mut inner = self.lock();
            let old = inner.states.get(&entity.entity_id).cloned();
            let changed = old.as_ref().is_none_or(|old| !old.same_content(&entity));
            let mut stored = entity.clone();
            if let Some(old) = old.as_ref().filter(|old| old.state == entity.state) {
                stored.last_changed = old.last_changed;
            }
            inner.states.insert(entity.entity_id.clone(), stored);
            (old, changed)
        };
        if changed {
            self.bus.publish(Event::state_changed(old, entity)).await?;
        }
        Ok(())
    }

    async fn remove_state(&self, entity_id: &str) -> Result<Option<Entity>, MitmLightError> {
        let old = self.lock().states.remove(entity_id);
        if let Some(old) = &old {
            self.bus.publish(Event::entity_removed(old.clone())).await?;
        }
        Ok(old)
    }
}

impl EntityRegistry for InMemoryHost {
    async fn register(&self, entry: RegistryEntry) -> Result<String, MitmLightError> {
        let mut inner = self.lock();
        let Inner {
            states, registry, ..
        } = &mut *inner;
        let entity_id = registry.register(entry, |candidate| states.contains_key(candidate))?;
        Ok(entity_id)
    }

    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<String>, MitmLightError> {
        Ok(self
            .lock()
            .registry
            .by_unique_id(unique_id)
            .map(|record| record.entity_id.clone()))
    }

    async fn remove_config_entry(&self, entry_id: LinkId) -> Result<Vec<String>, MitmLightError> {
        Ok(self.lock().registry.remove_config_entry(entry_id))
    }
}

impl DeviceRegistry for InMemoryHost {
    async fn device_for_entity(&self, entity_id: &str) -> Result<Option<Device>, MitmLightError> {
        let inner = self.lock();
        Ok(inner
            .registry
            .by_entity_id(entity_id)
            .and_then(|record| record.device_id)
            .and_then(|device_id| inner.devices.get(&device_id))
            .cloned())
    }
}

impl ServiceCaller for InMemoryHost {
    async fn call_service(&self, call: ServiceCall) -> Result<(), MitmLightError> {
        tracing::debug!(service = %call.qualified_name(), entity_id = %call.entity_id, "service call");
        let updated = {
            let mut inner = self.lock();
            inner.service_calls.push(call.clone());
            if inner.unavailable.contains(&call.entity_id) {
                return Err(MemoryHostError::EntityUnavailable(call.entity_id).into());
            }
            match inner.lights.get_mut(&call.entity_id) {
                Some(light) if call.domain == LIGHT_DOMAIN => Some(light.handle_service(&call)?),
                _ => None,
            }
        };
        if let Some(entity) = updated {
            self.set_state(entity).await?;
        }
        Ok(())
    }
}

impl RestoreStateStore for InMemoryHost {
    async fn last_state(&self, entity_id: &str) -> Result<Option<Entity>, MitmLightError> {
        Ok(self.saved_state(entity_id))
    }

    async fn save_state(&self, entity: Entity) -> Result<(), MitmLightError> {
        self.lock().restore.insert(entity.entity_id.clone(), entity);
        Ok(())
    }

    async fn forget_state(&self, entity_id: &str) -> Result<(), MitmLightError> {
        self.lock().restore.remove(entity_id);
        Ok(())
    }
}

impl EventSubscriber for InMemoryHost {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mitmlight_app::event_bus::track_state_change;
    use mitmlight_domain::event::EventType;
    use mitmlight_domain::light::{ATTR_BRIGHTNESS, ColorMode};

    fn entity(entity_id: &str, state: EntityState) -> Entity {
        Entity::builder()
            .entity_id(entity_id)
            .state(state)
            .build()
            .unwrap()
    }

    fn desk() -> VirtualLightConfig {
        VirtualLightConfig {
            entity_id: "light.desk".to_string(),
            name: "Desk lamp".to_string(),
            supported_color_modes: vec![ColorMode::Hs],
            ..VirtualLightConfig::default()
        }
    }

    #[tokio::test]
    async fn should_publish_only_effective_changes() {
        let host = InMemoryHost::default();
        let mut sub = track_state_change(&host, ["switch.a"]);

        host.set_state(entity("switch.a", EntityState::Off)).await.unwrap();
        host.set_state(entity("switch.a", EntityState::Off)).await.unwrap();
        host.set_state(entity("switch.a", EntityState::On)).await.unwrap();

        let first = sub.try_next().unwrap();
        assert!(first.old_state.is_none());
        let second = sub.try_next().unwrap();
        assert_eq!(second.old_state.unwrap().state, EntityState::Off);
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn should_publish_removal() {
        let host = InMemoryHost::default();
        host.set_state(entity("switch.a", EntityState::On)).await.unwrap();
        let mut sub = track_state_change(&host, ["switch.a"]);

        let removed = host.remove_state("switch.a").await.unwrap();
        assert!(removed.is_some());
        let event = sub.try_next().unwrap();
        assert_eq!(event.event_type, EventType::EntityRemoved);
        assert!(event.new_state.is_none());
    }

    #[tokio::test]
    async fn should_reject_malformed_state() {
        let host = InMemoryHost::default();
        let mut bad = entity("switch.a", EntityState::On);
        bad.entity_id = "nodot".to_string();
        assert!(host.set_state(bad).await.is_err());
    }

    #[tokio::test]
    async fn should_register_virtual_light_with_device() {
        let host = InMemoryHost::default();
        let entity_id = host.add_virtual_light(&desk()).await.unwrap();

        assert_eq!(entity_id, "light.desk");
        assert_eq!(host.state("light.desk").unwrap().state, EntityState::Off);
        let device = host.device_for_entity("light.desk").await.unwrap().unwrap();
        assert_eq!(device.name, "Desk lamp");
        assert_eq!(
            host.registry_record("light.desk").unwrap().platform,
            VIRTUAL_PLATFORM
        );
    }

    #[tokio::test]
    async fn should_reject_duplicate_virtual_light() {
        let host = InMemoryHost::default();
        host.add_virtual_light(&desk()).await.unwrap();
        assert!(matches!(
            host.add_virtual_light(&desk()).await,
            Err(MitmLightError::Host(_))
        ));
    }

    #[tokio::test]
    async fn should_not_hand_out_entity_ids_of_existing_states() {
        let host = InMemoryHost::default();
        host.add_virtual_light(&desk()).await.unwrap();
        let entity_id = host
            .register(RegistryEntry {
                domain: "light".to_string(),
                platform: "mitmlight".to_string(),
                unique_id: "x".to_string(),
                suggested_name: "Desk".to_string(),
                config_entry_id: None,
                device_id: None,
            })
            .await
            .unwrap();
        assert_eq!(entity_id, "light.desk_2");
    }

    #[tokio::test]
    async fn should_apply_service_calls_to_virtual_lights() {
        let host = InMemoryHost::default();
        host.add_virtual_light(&desk()).await.unwrap();

        let mut data = serde_json::Map::new();
        data.insert("brightness".to_string(), 77.into());
        host.call_service(ServiceCall::new("light", "turn_on", "light.desk", data))
            .await
            .unwrap();

        let state = host.state("light.desk").unwrap();
        assert!(state.is_on());
        assert_eq!(
            state.get_attribute(ATTR_BRIGHTNESS).and_then(|v| v.as_int()),
            Some(77)
        );
        assert_eq!(host.service_calls().len(), 1);
    }

    #[tokio::test]
    async fn should_log_calls_to_unknown_entities() {
        let host = InMemoryHost::default();
        host.call_service(ServiceCall::new(
            "light",
            "turn_off",
            "light.elsewhere",
            serde_json::Map::new(),
        ))
        .await
        .unwrap();
        assert_eq!(host.service_calls()[0].entity_id, "light.elsewhere");
        host.clear_service_calls();
        assert!(host.service_calls().is_empty());
    }

    #[tokio::test]
    async fn should_fail_calls_to_unavailable_entities() {
        let host = InMemoryHost::default();
        host.add_virtual_light(&desk()).await.unwrap();
        host.mark_unavailable("light.desk").await.unwrap();

        assert_eq!(
            host.state("light.desk").unwrap().state,
            EntityState::Unavailable
        );
        let result = host
            .call_service(ServiceCall::new(
                "light",
                "turn_on",
                "light.desk",
                serde_json::Map::new(),
            ))
            .await;
        assert!(matches!(result, Err(MitmLightError::Host(_))));
    }

    #[tokio::test]
    async fn should_keep_and_forget_saved_states() {
        let host = InMemoryHost::default();
        host.save_state(entity("light.a", EntityState::On)).await.unwrap();
        assert!(host.last_state("light.a").await.unwrap().is_some());
        host.forget_state("light.a").await.unwrap();
        assert!(host.last_state("light.a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_build_from_config() {
        let config = MemoryHostConfig {
            event_bus_capacity: 8,
            lights: vec![desk(), VirtualLightConfig::default()],
        };
        let host = InMemoryHost::from_config(&config).await.unwrap();
        assert!(host.state("light.desk").is_some());
        assert!(host.state("light.virtual_light").is_some());
        assert_eq!(host.registry_records().len(), 2);
    }
}
