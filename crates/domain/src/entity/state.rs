//! The `state` string of an entity, narrowed to what switches and lights report.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// State value of a switch or light entity.
///
/// Anything the host reports outside these four values is treated as
/// [`Unknown`](Self::Unknown) when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    On,
    Off,
    #[default]
    Unknown,
    Unavailable,
}

impl EntityState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
            Self::Unavailable => "unavailable",
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        self == Self::On
    }

    /// `false` only for [`Unavailable`](Self::Unavailable): an unknown state
    /// still belongs to a reachable entity.
    #[must_use]
    pub fn is_available(self) -> bool {
        self != Self::Unavailable
    }
}

impl From<bool> for EntityState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl FromStr for EntityState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "on" => Self::On,
            "off" => Self::Off,
            "unavailable" => Self::Unavailable,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
