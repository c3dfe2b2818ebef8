//! Application layer - Use cases and orchestration
//!
//! Defines the ports the departure monitor needs from the outside world
//! (a transit backend and a configuration store) and the services built on
//! them: the poll coordinator, per-line sensors, hubs and hub setup.

pub mod error;
pub mod hub_config;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use hub_config::{Backend, HUB_KEY_PREFIX, HubConfig, LineChanges, hub_key};
pub use ports::*;
pub use services::*;
