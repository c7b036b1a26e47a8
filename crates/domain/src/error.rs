//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`MitmLightError`] via `#[from]`.

/// Top-level error for every fallible operation in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum MitmLightError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// Failure reported by a host adapter (state store, registry, service bus).
    #[error("host error")]
    Host(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations and malformed input.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("entity_id must not be empty")]
    EmptyEntityId,

    #[error("entity_id {0:?} must have the form `domain.object_id`")]
    MalformedEntityId(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("at most one color representation may be given, got {0}")]
    MultipleColors(usize),

    #[error("invalid service data")]
    InvalidServiceData(#[source] serde_json::Error),

    #[error("service {domain}.{service} is not supported")]
    UnsupportedService { domain: String, service: String },
}

/// A looked-up record does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Fatal configuration problems detected while setting up a link.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("source entity ID not found in configuration")]
    MissingTarget,

    #[error("target {0:?} is not a light entity")]
    NotALight(String),
}
