//! Device records.
//!
//! Proxy entities attach themselves to the device record of their target
//! light so they show up next to it.

use serde::{Deserialize, Serialize};

use crate::error::{MitmLightError, ValidationError};
use crate::id::DeviceId;

/// A device record known to the host's device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

impl Device {
    /// A fresh device with only a name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for a blank name.
    pub fn new(name: impl Into<String>) -> Result<Self, MitmLightError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Self {
            id: DeviceId::new(),
            name,
            manufacturer: None,
            model: None,
        })
    }

    #[must_use]
    pub fn with_model(
        mut self,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self.model = Some(model.into());
        self
    }
}
