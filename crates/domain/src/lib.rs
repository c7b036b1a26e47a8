//! # mitmlight-domain
//!
//! Pure domain model for the "man in the middle" light integration.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **Entities** as the host sees them (state, attributes, device link)
//! - Define **Devices**, **Events** (state changes) and **Service calls**
//! - Define the **light model**: color modes, mutually exclusive colors,
//!   capability snapshots, `turn_on` parameters and proxy light state
//! - Define the **link**: the config entry naming a target light and the
//!   two proxy variants placed in front of it
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod device;
pub mod entity;
pub mod event;
pub mod light;
pub mod link;
pub mod service;
