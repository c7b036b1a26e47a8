//! Test double implementing every host port in memory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use mitmlight_domain::device::Device;
use mitmlight_domain::entity::{Entity, EntityState};
use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::event::Event;
use mitmlight_domain::id::LinkId;
use mitmlight_domain::service::ServiceCall;

use crate::event_bus::InProcessEventBus;
use crate::ports::{
    DeviceRegistry, EntityRegistry, EventPublisher, EventSubscriber, RegistryEntry,
    RestoreStateStore, ServiceCaller, StateStore,
};

#[derive(Default)]
struct Inner {
    states: HashMap<String, Entity>,
    registry: HashMap<String, (String, Option<LinkId>)>,
    devices: HashMap<String, Device>,
    restore: HashMap<String, Entity>,
    calls: Vec<ServiceCall>,
    fail_calls: bool,
}

pub(crate) struct FakeHost {
    inner: Mutex<Inner>,
    bus: InProcessEventBus,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            bus: InProcessEventBus::new(64),
        }
    }
}

impl FakeHost {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put a bare state, bypassing the event bus.
    pub(crate) fn put(&self, entity_id: &str, state: EntityState) {
        let entity = Entity::builder()
            .entity_id(entity_id)
            .state(state)
            .build()
            .unwrap();
        self.put_entity(entity);
    }

    pub(crate) fn put_entity(&self, entity: Entity) {
        self.lock().states.insert(entity.entity_id.clone(), entity);
    }

    pub(crate) fn state(&self, entity_id: &str) -> Option<Entity> {
        self.lock().states.get(entity_id).cloned()
    }

    pub(crate) fn register_unique_id(&self, unique_id: &str, entity_id: &str) {
        self.lock()
            .registry
            .insert(unique_id.to_string(), (entity_id.to_string(), None));
    }

    pub(crate) fn has_registration(&self, unique_id: &str) -> bool {
        self.lock().registry.contains_key(unique_id)
    }

    pub(crate) fn link_device(&self, entity_id: &str, device: Device) {
        self.lock().devices.insert(entity_id.to_string(), device);
    }

    pub(crate) fn put_restore(&self, entity: Entity) {
        self.lock().restore.insert(entity.entity_id.clone(), entity);
    }

    pub(crate) fn restored(&self, entity_id: &str) -> Option<Entity> {
        self.lock().restore.get(entity_id).cloned()
    }

    pub(crate) fn calls(&self) -> Vec<ServiceCall> {
        self.lock().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub(crate) fn fail_service_calls(&self) {
        self.lock().fail_calls = true;
    }
}

impl StateStore for FakeHost {
    async fn get_state(&self, entity_id: &str) -> Result<Option<Entity>, MitmLightError> {
        Ok(self.state(entity_id))
    }

    async fn set_state(&self, entity: Entity) -> Result<(), MitmLightError> {
        let old = self
            .lock()
            .states
            .insert(entity.entity_id.clone(), entity.clone());
        if old.as_ref().is_some_and(|old| old.same_content(&entity)) {
            return Ok(());
        }
        self.bus.publish(Event::state_changed(old, entity)).await
    }

    async fn remove_state(&self, entity_id: &str) -> Result<Option<Entity>, MitmLightError> {
        let old = self.lock().states.remove(entity_id);
        if let Some(old) = &old {
            self.bus.publish(Event::entity_removed(old.clone())).await?;
        }
        Ok(old)
    }
}

impl EntityRegistry for FakeHost {
    async fn register(&self, entry: RegistryEntry) -> Result<String, MitmLightError> {
        let mut inner = self.lock();
        if let Some((entity_id, _)) = inner.registry.get(&entry.unique_id) {
            return Ok(entity_id.clone());
        }
        let slug = entry.suggested_name.to_lowercase().replace(' ', "_");
        let entity_id = format!("{}.{slug}", entry.domain);
        inner.registry.insert(
            entry.unique_id,
            (entity_id.clone(), entry.config_entry_id),
        );
        Ok(entity_id)
    }

    async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<String>, MitmLightError> {
        Ok(self
            .lock()
            .registry
            .get(unique_id)
            .map(|(entity_id, _)| entity_id.clone()))
    }

    async fn remove_config_entry(&self, entry_id: LinkId) -> Result<Vec<String>, MitmLightError> {
        let mut inner = self.lock();
        let mut removed = Vec::new();
        inner.registry.retain(|_, (entity_id, owner)| {
            let owned = *owner == Some(entry_id);
            if owned {
                removed.push(entity_id.clone());
            }
            !owned
        });
        Ok(removed)
    }
}

impl DeviceRegistry for FakeHost {
    async fn device_for_entity(&self, entity_id: &str) -> Result<Option<Device>, MitmLightError> {
        Ok(self.lock().devices.get(entity_id).cloned())
    }
}

impl ServiceCaller for FakeHost {
    async fn call_service(&self, call: ServiceCall) -> Result<(), MitmLightError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.fail_calls {
            return Err(MitmLightError::Host("service bus unavailable".into()));
        }
        Ok(())
    }
}

impl RestoreStateStore for FakeHost {
    async fn last_state(&self, entity_id: &str) -> Result<Option<Entity>, MitmLightError> {
        Ok(self.restored(entity_id))
    }

    async fn save_state(&self, entity: Entity) -> Result<(), MitmLightError> {
        self.put_restore(entity);
        Ok(())
    }

    async fn forget_state(&self, entity_id: &str) -> Result<(), MitmLightError> {
        self.lock().restore.remove(entity_id);
        Ok(())
    }
}

impl EventSubscriber for FakeHost {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}
