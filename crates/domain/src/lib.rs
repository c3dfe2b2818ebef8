//! Domain layer for the departures monitor
//!
//! Contains the transit vocabulary (stops, lines, departures, transport modes),
//! the departure-time stabilizer and the pure line-id and deduplication helpers.
//! This layer performs no I/O.

pub mod dedupe;
pub mod entities;
pub mod errors;
pub mod line_id;
pub mod stabilizer;
pub mod value_objects;

pub use dedupe::{dedupe_by_key, dedupe_scheduled, filter_identical_departures, unique_lines};
pub use entities::*;
pub use errors::DomainError;
pub use line_id::{
    compare_line_ids, current_service_year, filter_by_line_id, replace_year_token,
    replace_year_token_with,
};
pub use stabilizer::{DepartureReading, DepartureStabilizer, EstimatedTimePolicy, MAX_NONE_VALUES};
pub use value_objects::*;
