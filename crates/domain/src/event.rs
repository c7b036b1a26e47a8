//! Event: an immutable record of an entity state transition.
//!
//! The host publishes one event per effective state write, carrying the
//! snapshots before and after. A removed entity produces an event whose
//! `new_state` is `None`.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Timestamp, now};
use crate::id::EventId;

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StateChanged,
    EntityRemoved,
}

/// A state-change record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub entity_id: String,
    pub old_state: Option<Entity>,
    pub new_state: Option<Entity>,
    pub timestamp: Timestamp,
}

impl Event {
    /// Event for a write that created or changed `new_state`.
    #[must_use]
    pub fn state_changed(old_state: Option<Entity>, new_state: Entity) -> Self {
        Self {
            id: EventId::new(),
            event_type: EventType::StateChanged,
            entity_id: new_state.entity_id.clone(),
            old_state,
            new_state: Some(new_state),
            timestamp: now(),
        }
    }

    /// Event for an entity whose state was removed from the host.
    #[must_use]
    pub fn entity_removed(old_state: Entity) -> Self {
        Self {
            id: EventId::new(),
            event_type: EventType::EntityRemoved,
            entity_id: old_state.entity_id.clone(),
            old_state: Some(old_state),
            new_state: None,
            timestamp: now(),
        }
    }
}
