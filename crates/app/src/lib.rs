//! # mitmlight-app
//!
//! Application layer: the integration itself plus the **port definitions**
//! (traits) describing what it needs from its host.
//!
//! ## Responsibilities
//! - Define **port traits** the host adapter implements:
//!   - `StateStore`: read/write/remove entity states (writes notify observers)
//!   - `EntityRegistry`: assign entity ids, look up by unique id
//!   - `DeviceRegistry`: device record of an entity
//!   - `ServiceCaller`: issue `light.turn_on` / `light.turn_off`
//!   - `RestoreStateStore`: last known state across restarts
//!   - `EventSubscriber`: state-change event bus
//! - Provide the **entities**: `ToggleSwitch` and the two `ProxyLight`s
//! - Provide the **active proxy selector**, the **link** runtime binding the
//!   three entities to one config entry, the **link manager** and the
//!   **config flow**
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `mitmlight-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod config_flow;
pub mod entities;
pub mod event_bus;
pub mod link;
pub mod ports;
pub mod selector;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
