//! # mitmlight-adapter-memory
//!
//! In-memory host implementing every port of `mitmlight-app`, so links can
//! be set up and driven end to end without a real automation platform.
//!
//! ## Provided ports
//!
//! | Port | Backing |
//! |------|---------|
//! | `StateStore` | map of entity states; effective writes publish `state_changed` |
//! | `EntityRegistry` | `{domain}.{slug}` ids, `_2`, `_3`… on collision |
//! | `DeviceRegistry` | devices of registered entities |
//! | `ServiceCaller` | call log; calls to virtual lights update their state |
//! | `RestoreStateStore` | map of saved states |
//! | `EventSubscriber` | in-process broadcast bus |
//!
//! ## Dependency rule
//!
//! Depends on `mitmlight-app` (port traits) and `mitmlight-domain` only.

pub mod config;
pub mod error;
mod host;
mod registry;
mod virtual_light;

pub use config::{MemoryHostConfig, VirtualLightConfig};
pub use error::MemoryHostError;
pub use host::{InMemoryHost, VIRTUAL_PLATFORM};
pub use registry::RegistryRecord;
pub use virtual_light::VirtualLight;
