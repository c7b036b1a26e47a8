//! In-memory host error types.

use mitmlight_domain::error::MitmLightError;

/// Errors specific to the in-memory host.
#[derive(Debug, thiserror::Error)]
pub enum MemoryHostError {
    /// No entity id can be derived from the suggested name.
    #[error("cannot derive an entity id from name {0:?}")]
    EmptySlug(String),

    /// A virtual light with this entity id already exists.
    #[error("virtual light {0} already exists")]
    DuplicateLight(String),

    /// The addressed entity has been marked unavailable.
    #[error("entity {0} is unavailable")]
    EntityUnavailable(String),

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] MitmLightError),
}

impl MemoryHostError {
    /// Convert into a [`MitmLightError::Host`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> MitmLightError {
        match self {
            Self::Domain(err) => err,
            other => MitmLightError::Host(Box::new(other)),
        }
    }
}

impl From<MemoryHostError> for MitmLightError {
    fn from(err: MemoryHostError) -> Self {
        err.into_domain()
    }
}

impl From<MitmLightError> for MemoryHostError {
    fn from(err: MitmLightError) -> Self {
        Self::Domain(err)
    }
}
