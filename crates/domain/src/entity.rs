//! Entity: a state holder as the host sees it.
//!
//! An entity is addressed by its `entity_id` string (`light.kitchen`),
//! carries a discrete [`EntityState`] and a bag of typed attributes, and may
//! be linked to a [`Device`](crate::device::Device).

mod attribute_value;
mod state;

pub use attribute_value::AttributeValue;
pub use state::EntityState;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MitmLightError, ValidationError};
use crate::id::DeviceId;

/// UTC time of a state write or change.
pub type Timestamp = DateTime<Utc>;

#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Attribute key holding the human readable name.
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";

/// A single observable/controllable thing known to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub unique_id: Option<String>,
    pub device_id: Option<DeviceId>,
    pub friendly_name: Option<String>,
    pub state: EntityState,
    pub attributes: HashMap<String, AttributeValue>,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl Entity {
    /// Create a builder for constructing an [`Entity`].
    #[must_use]
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::Validation`] when `entity_id` is empty or
    /// not of the form `domain.object_id`.
    pub fn validate(&self) -> Result<(), MitmLightError> {
        if self.entity_id.is_empty() {
            return Err(ValidationError::EmptyEntityId.into());
        }
        match self.entity_id.split_once('.') {
            Some((domain, object_id)) if !domain.is_empty() && !object_id.is_empty() => Ok(()),
            _ => Err(ValidationError::MalformedEntityId(self.entity_id.clone()).into()),
        }
    }

    /// Whether the entity reports [`EntityState::On`].
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Replace the state, bumping `last_changed` only when it differs.
    pub fn update_state(&mut self, state: EntityState, ts: Timestamp) {
        if self.state != state {
            self.last_changed = ts;
        }
        self.state = state;
        self.last_updated = ts;
    }

    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Name shown to users: the friendly name, else the `friendly_name`
    /// attribute, else the object id with underscores turned into spaces.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.friendly_name {
            return name.clone();
        }
        if let Some(name) = self
            .get_attribute(ATTR_FRIENDLY_NAME)
            .and_then(AttributeValue::as_str)
        {
            return name.to_string();
        }
        split_entity_id(&self.entity_id).1.replace('_', " ")
    }

    /// Same state and attributes; used to skip no-op writes.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.state == other.state && self.attributes == other.attributes
    }
}

/// Split `light.kitchen` into `("light", "kitchen")`.
///
/// Ids without a dot yield an empty domain.
#[must_use]
pub fn split_entity_id(entity_id: &str) -> (&str, &str) {
    entity_id.split_once('.').unwrap_or(("", entity_id))
}

/// `living_room` → `Living Room`.
#[must_use]
pub fn title_from_object_id(object_id: &str) -> String {
    object_id
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Step-by-step builder for [`Entity`].
#[derive(Debug, Default)]
pub struct EntityBuilder {
    entity_id: Option<String>,
    unique_id: Option<String>,
    device_id: Option<DeviceId>,
    friendly_name: Option<String>,
    state: Option<EntityState>,
    attributes: HashMap<String, AttributeValue>,
}

impl EntityBuilder {
    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    #[must_use]
    pub fn device_id(mut self, device_id: Option<DeviceId>) -> Self {
        self.device_id = device_id;
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn attributes(mut self, attributes: HashMap<String, AttributeValue>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Consume the builder, validate, and return an [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns [`MitmLightError::Validation`] if `entity_id` is missing or malformed.
    pub fn build(self) -> Result<Entity, MitmLightError> {
        let ts = now();
        let entity = Entity {
            entity_id: self.entity_id.unwrap_or_default(),
            unique_id: self.unique_id,
            device_id: self.device_id,
            friendly_name: self.friendly_name,
            state: self.state.unwrap_or_default(),
            attributes: self.attributes,
            last_changed: ts,
            last_updated: ts,
        };
        entity.validate()?;
        Ok(entity)
    }
}
