//! Port definitions: traits the host adapter implements.
//!
//! Ports are the boundaries between the integration and its host platform.
//! They are defined here (in `app`) so that both the entities and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod device_registry;
pub mod entity_registry;
pub mod event_bus;
pub mod restore_state;
pub mod service_caller;
pub mod state_store;

pub use device_registry::DeviceRegistry;
pub use entity_registry::{EntityRegistry, RegistryEntry};
pub use event_bus::{EventPublisher, EventSubscriber};
pub use restore_state::RestoreStateStore;
pub use service_caller::ServiceCaller;
pub use state_store::StateStore;

/// Everything the integration consumes from its host.
///
/// Implemented automatically for any type providing all the ports.
pub trait Host:
    StateStore + EntityRegistry + DeviceRegistry + ServiceCaller + RestoreStateStore + EventSubscriber
{
}

impl<T> Host for T where
    T: StateStore
        + EntityRegistry
        + DeviceRegistry
        + ServiceCaller
        + RestoreStateStore
        + EventSubscriber
{
}
