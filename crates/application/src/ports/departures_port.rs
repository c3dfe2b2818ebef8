//! Departures backend port
//!
//! Defines how the application reads departures, stops and lines from a
//! transit backend. Adapters in the infrastructure layer implement this port
//! on top of the Motis and EFA clients.

use async_trait::async_trait;
use domain::{Departure, GeoLocation, Line, Stop};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Parameters of one stop-times request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimesQuery {
    /// Stop to query
    pub stop_id: String,
    /// Maximum number of departures
    pub count: u32,
    /// Include stops within this radius in meters
    pub radius_m: Option<u32>,
}

impl StopTimesQuery {
    /// Create a new query
    #[must_use]
    pub fn new(stop_id: impl Into<String>, count: u32) -> Self {
        Self {
            stop_id: stop_id.into(),
            count,
            radius_m: None,
        }
    }

    /// Set the search radius
    #[must_use]
    pub const fn with_radius(mut self, radius_m: Option<u32>) -> Self {
        self.radius_m = radius_m;
        self
    }
}

/// Port for reading departure data from a transit backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DeparturesPort: Send + Sync {
    /// Upcoming departures at a stop
    async fn stop_times(&self, query: &StopTimesQuery) -> Result<Vec<Departure>, ApplicationError>;

    /// Stops matching a free-text query
    async fn search_stops(&self, query: &str) -> Result<Vec<Stop>, ApplicationError>;

    /// Lines serving a stop
    async fn lines_at_stop(&self, stop_id: &str) -> Result<Vec<Line>, ApplicationError>;

    /// Stops within `radius_m` of a location, empty when the backend has no
    /// area search
    async fn stops_near(
        &self,
        location: &GeoLocation,
        radius_m: u32,
    ) -> Result<Vec<Stop>, ApplicationError>;
}
