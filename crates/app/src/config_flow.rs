//! Config flow: creating and editing link config entries.
//!
//! Both the user step and the options step take a single field,
//! `source_entity_id`, naming the target light. Submitting nothing shows
//! the form; invalid input shows it again with errors.

use std::collections::BTreeMap;

use mitmlight_domain::entity::{split_entity_id, title_from_object_id};
use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::light::LIGHT_DOMAIN;
use mitmlight_domain::link::{CONF_SOURCE_ENTITY_ID, ConfigEntry, ConfigMap, DEFAULT_TITLE};

use crate::ports::StateStore;

pub const STEP_USER: &str = "user";
pub const STEP_INIT: &str = "init";

/// Form-wide error key.
pub const ERROR_BASE: &str = "base";
pub const ERROR_REQUIRED: &str = "required";
pub const ERROR_ENTITY_NOT_FOUND: &str = "entity_not_found";
pub const ERROR_NOT_A_LIGHT: &str = "not_a_light";

pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// Outcome of one flow step.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    /// Show (again) the form of `step_id`, with errors keyed by field or
    /// [`ERROR_BASE`].
    Form {
        step_id: &'static str,
        errors: BTreeMap<&'static str, &'static str>,
    },
    /// Create an entry (user step) or replace its options (options step).
    CreateEntry { title: String, data: ConfigMap },
    Abort { reason: &'static str },
}

impl FlowResult {
    fn form(step_id: &'static str) -> Self {
        Self::Form {
            step_id,
            errors: BTreeMap::new(),
        }
    }
}

/// Flow steps, validated against the host's current states.
pub struct ConfigFlow<'a, S: ?Sized> {
    states: &'a S,
}

impl<'a, S: StateStore + ?Sized> ConfigFlow<'a, S> {
    #[must_use]
    pub fn new(states: &'a S) -> Self {
        Self { states }
    }

    /// First step of creating a link.
    ///
    /// `existing` are the config entries already set up; a second entry
    /// for the same target aborts.
    ///
    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn step_user(
        &self,
        existing: &[ConfigEntry],
        input: Option<&ConfigMap>,
    ) -> Result<FlowResult, MitmLightError> {
        let Some(input) = input else {
            return Ok(FlowResult::form(STEP_USER));
        };
        let source = match self.validate(input).await? {
            Ok(source) => source,
            Err(errors) => {
                return Ok(FlowResult::Form {
                    step_id: STEP_USER,
                    errors,
                });
            }
        };

        if existing
            .iter()
            .any(|entry| entry.source_entity_id() == Some(source))
        {
            tracing::debug!(%source, "source light already configured");
            return Ok(FlowResult::Abort {
                reason: ABORT_ALREADY_CONFIGURED,
            });
        }

        Ok(FlowResult::CreateEntry {
            title: self.entry_title(input).await?,
            data: source_only(source),
        })
    }

    /// Options step of an existing entry.
    ///
    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn step_init(
        &self,
        entry: &ConfigEntry,
        input: Option<&ConfigMap>,
    ) -> Result<FlowResult, MitmLightError> {
        let Some(input) = input else {
            return Ok(FlowResult::form(STEP_INIT));
        };
        match self.validate(input).await? {
            Ok(source) => Ok(FlowResult::CreateEntry {
                title: entry.title.clone(),
                data: source_only(source),
            }),
            Err(errors) => Ok(FlowResult::Form {
                step_id: STEP_INIT,
                errors,
            }),
        }
    }

    /// Title of a new entry: the target's display name, the title-cased
    /// object id when the target has no state, else the default.
    ///
    /// # Errors
    ///
    /// Propagates state store failures.
    pub async fn entry_title(&self, input: &ConfigMap) -> Result<String, MitmLightError> {
        let Some(source) = source_of(input) else {
            return Ok(DEFAULT_TITLE.to_string());
        };
        Ok(match self.states.get_state(source).await? {
            Some(state) => state.display_name(),
            None => title_from_object_id(split_entity_id(source).1),
        })
    }

    async fn validate<'i>(
        &self,
        input: &'i ConfigMap,
    ) -> Result<Result<&'i str, BTreeMap<&'static str, &'static str>>, MitmLightError> {
        let mut errors = BTreeMap::new();
        let Some(source) = source_of(input) else {
            errors.insert(CONF_SOURCE_ENTITY_ID, ERROR_REQUIRED);
            return Ok(Err(errors));
        };
        if split_entity_id(source).0 != LIGHT_DOMAIN {
            errors.insert(CONF_SOURCE_ENTITY_ID, ERROR_NOT_A_LIGHT);
        } else if self.states.get_state(source).await?.is_none() {
            errors.insert(ERROR_BASE, ERROR_ENTITY_NOT_FOUND);
        }
        if errors.is_empty() {
            Ok(Ok(source))
        } else {
            Ok(Err(errors))
        }
    }
}

fn source_of(input: &ConfigMap) -> Option<&str> {
    input
        .get(CONF_SOURCE_ENTITY_ID)
        .and_then(serde_json::Value::as_str)
        .filter(|source| !source.is_empty())
}

fn source_only(source: &str) -> ConfigMap {
    let mut data = ConfigMap::new();
    data.insert(CONF_SOURCE_ENTITY_ID.to_string(), source.into());
    data
}
