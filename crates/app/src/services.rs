//! Application services: use-case implementations.
//!
//! Services accept port implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete
//! adapters.

pub mod link_manager;
