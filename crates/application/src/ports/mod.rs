//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod config_store;
mod departures_port;

pub use config_store::ConfigStore;
#[cfg(test)]
pub use config_store::MockConfigStore;
pub use departures_port::{DeparturesPort, StopTimesQuery};
#[cfg(test)]
pub use departures_port::MockDeparturesPort;
