//! Service call: a command addressed to one entity.
//!
//! Examples: `light.turn_on` with `{"brightness": 128}`, `switch.turn_off`.

use serde::{Deserialize, Serialize};

/// Service that switches an entity on (optionally with attributes).
pub const SERVICE_TURN_ON: &str = "turn_on";
/// Service that switches an entity off.
pub const SERVICE_TURN_OFF: &str = "turn_off";
/// Service that flips an entity's on/off state.
pub const SERVICE_TOGGLE: &str = "toggle";

/// A single service invocation against one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ServiceCall {
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: impl Into<String>,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity_id: entity_id.into(),
            data,
        }
    }

    /// `domain.service`, as used in logs.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }
}
