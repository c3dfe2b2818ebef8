//! Application services - Use case implementations

mod coordinator;
mod hub;
mod line_sensor;
mod setup_service;

pub use coordinator::{
    DEFAULT_STOP_RADIUS_M, DEFAULT_TIMES_PER_LINE, DeparturesCoordinator, PollSettings,
};
pub use hub::DepartureHub;
pub use line_sensor::{DEPARTURE_SLOTS, LineSensor, SensorState, slot_keys};
pub use setup_service::SetupService;
