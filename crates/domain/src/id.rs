//! Typed identifiers.
//!
//! Every id wraps a random UUID and renders as 32 lowercase hex digits, the
//! same shape hosts use for config entry ids. That keeps unique ids such as
//! `"{entry_id}_proxy"` free of extra separators. Parsing accepts both the
//! compact and the hyphenated form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_ids {
    ($($(#[doc = $doc:expr])* $name:ident;)+) => {$(
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.simple(), f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = uuid::Error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    )+};
}

define_ids! {
    /// A [`Device`](crate::device::Device) entities can be attached to.
    DeviceId;
    /// A link config entry; prefixes the unique ids of the entities it owns.
    LinkId;
    /// One published [`Event`](crate::event::Event).
    EventId;
}
