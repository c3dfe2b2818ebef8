//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod departures_adapter;
mod memory_config_store;

pub use departures_adapter::{
    DEFAULT_LINE_DISCOVERY_WINDOW, EfaDeparturesAdapter, MotisDeparturesAdapter, departures_port,
};
pub use integration_departures::{EFA_ENDPOINTS, efa_endpoint};
pub use memory_config_store::InMemoryConfigStore;
