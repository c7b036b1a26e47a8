//! Link: one config entry placing two proxies and a toggle in front of a
//! target light.

use serde::{Deserialize, Serialize};

use crate::entity::split_entity_id;
use crate::error::{ConfigError, MitmLightError};
use crate::id::LinkId;
use crate::light::LIGHT_DOMAIN;

/// Integration name used as the registry platform.
pub const INTEGRATION_DOMAIN: &str = "mitmlight";

/// Config key holding the target light's entity id.
pub const CONF_SOURCE_ENTITY_ID: &str = "source_entity_id";

/// Title used when no better one can be derived.
pub const DEFAULT_TITLE: &str = "Man in the Middle Light";

/// Unique-id / name suffix of the toggle switch.
pub const SUFFIX_OVERRIDDEN: &str = "overridden";

/// Entity domain of the toggle switch.
pub const SWITCH_DOMAIN: &str = "switch";

pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// A persisted config entry as created by the config flow.
///
/// `options` is written by the options flow and takes precedence over
/// `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: LinkId,
    pub title: String,
    #[serde(default)]
    pub data: ConfigMap,
    #[serde(default)]
    pub options: ConfigMap,
}

impl ConfigEntry {
    #[must_use]
    pub fn new(title: impl Into<String>, data: ConfigMap) -> Self {
        Self {
            entry_id: LinkId::new(),
            title: title.into(),
            data,
            options: ConfigMap::new(),
        }
    }

    /// Target entity id, options first.
    #[must_use]
    pub fn source_entity_id(&self) -> Option<&str> {
        fn lookup(map: &ConfigMap) -> Option<&str> {
            map.get(CONF_SOURCE_ENTITY_ID)
                .and_then(serde_json::Value::as_str)
                .filter(|id| !id.is_empty())
        }
        lookup(&self.options).or_else(|| lookup(&self.data))
    }
}

/// Validated configuration of one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub entry_id: LinkId,
    pub title: String,
    pub target_entity_id: String,
}

impl LinkConfig {
    /// Derive the link configuration from a config entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTarget`] when no target is configured,
    /// or [`ConfigError::NotALight`] when it is not a `light.*` entity.
    pub fn from_entry(entry: &ConfigEntry) -> Result<Self, MitmLightError> {
        let target = entry.source_entity_id().ok_or(ConfigError::MissingTarget)?;
        if split_entity_id(target).0 != LIGHT_DOMAIN {
            return Err(ConfigError::NotALight(target.to_string()).into());
        }
        Ok(Self {
            entry_id: entry.entry_id,
            title: entry.title.clone(),
            target_entity_id: target.to_string(),
        })
    }

    /// `{entry_id}_{suffix}`.
    #[must_use]
    pub fn unique_id(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.entry_id)
    }

    /// `{title} {suffix}`.
    #[must_use]
    pub fn entity_name(&self, suffix: &str) -> String {
        format!("{} {suffix}", self.title)
    }
}

/// Which of the two proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyVariant {
    /// Drives the target while the toggle is off.
    Primary,
    /// Drives the target while the toggle is on.
    Override,
}

impl ProxyVariant {
    /// The variant driving the target for a given toggle value.
    #[must_use]
    pub fn active_for(overridden: bool) -> Self {
        if overridden { Self::Override } else { Self::Primary }
    }

    #[must_use]
    pub fn is_active_when(self, overridden: bool) -> bool {
        Self::active_for(overridden) == self
    }

    /// Unique-id / name suffix.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Primary => "proxy",
            Self::Override => "override",
        }
    }
}
