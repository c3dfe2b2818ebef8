//! Departures adapters - Implement DeparturesPort on the Motis and EFA clients

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{DeparturesPort, StopTimesQuery};
use application::{Backend, DEFAULT_STOP_RADIUS_M};
use async_trait::async_trait;
use domain::{Departure, GeoLocation, Line, Stop};
use integration_departures::{ApiConfig, ApiError, EfaClient, MotisClient};
use tracing::{debug, instrument};

/// Departures scanned to discover the lines of a Motis stop
pub const DEFAULT_LINE_DISCOVERY_WINDOW: u32 = 100;

/// Translate client errors at the port boundary
pub(crate) fn map_api_error(error: ApiError) -> ApplicationError {
    match error {
        ApiError::MalformedResponse(message) => ApplicationError::MalformedResponse(message),
        ApiError::InvalidRequest(message) => {
            ApplicationError::Domain(domain::DomainError::ValidationError(message))
        },
        ApiError::Configuration(message) => ApplicationError::Configuration(message),
        other @ (ApiError::HttpStatus { .. } | ApiError::Network { .. } | ApiError::Timeout { .. }) => {
            ApplicationError::ExternalService(other.to_string())
        },
    }
}

/// Build the port for a hub's backend
pub fn departures_port(
    backend: Backend,
    config: &ApiConfig,
) -> Result<Arc<dyn DeparturesPort>, ApplicationError> {
    debug!(%backend, url = %config.base_url, "Creating departures adapter");
    Ok(match backend {
        Backend::Motis => Arc::new(MotisDeparturesAdapter::new(config)?),
        Backend::Efa => Arc::new(EfaDeparturesAdapter::new(config)?),
    })
}

/// Motis adapter
#[derive(Debug)]
pub struct MotisDeparturesAdapter {
    client: MotisClient,
    line_window: u32,
    line_radius_m: Option<u32>,
}

impl MotisDeparturesAdapter {
    /// Create an adapter for the Motis API at `config.base_url`
    pub fn new(config: &ApiConfig) -> Result<Self, ApplicationError> {
        Ok(Self::from_client(MotisClient::new(config).map_err(map_api_error)?))
    }

    /// Wrap an existing client
    #[must_use]
    pub const fn from_client(client: MotisClient) -> Self {
        Self {
            client,
            line_window: DEFAULT_LINE_DISCOVERY_WINDOW,
            line_radius_m: Some(DEFAULT_STOP_RADIUS_M),
        }
    }

    /// Size of the departure window used for line discovery
    #[must_use]
    pub fn with_line_window(mut self, window: u32, radius_m: Option<u32>) -> Self {
        self.line_window = window.max(1);
        self.line_radius_m = radius_m;
        self
    }

    /// Underlying client
    #[must_use]
    pub const fn client(&self) -> &MotisClient {
        &self.client
    }
}

#[async_trait]
impl DeparturesPort for MotisDeparturesAdapter {
    #[instrument(skip(self), fields(stop_id = %query.stop_id))]
    async fn stop_times(&self, query: &StopTimesQuery) -> Result<Vec<Departure>, ApplicationError> {
        self.client
            .stop_times(&query.stop_id, query.count, query.radius_m)
            .await
            .map_err(map_api_error)
    }

    #[instrument(skip(self))]
    async fn search_stops(&self, query: &str) -> Result<Vec<Stop>, ApplicationError> {
        self.client.search_stops(query).await.map_err(map_api_error)
    }

    #[instrument(skip(self))]
    async fn lines_at_stop(&self, stop_id: &str) -> Result<Vec<Line>, ApplicationError> {
        self.client
            .lines_at_stop(stop_id, self.line_window, self.line_radius_m)
            .await
            .map_err(map_api_error)
    }

    #[instrument(skip(self), fields(location = %location))]
    async fn stops_near(
        &self,
        location: &GeoLocation,
        radius_m: u32,
    ) -> Result<Vec<Stop>, ApplicationError> {
        self.client
            .stops_around(location, f64::from(radius_m))
            .await
            .map_err(map_api_error)
    }
}

/// EFA adapter
///
/// EFA's departure monitor has no radius parameter; `radius_m` is ignored,
/// and there is no area stop search.
#[derive(Debug)]
pub struct EfaDeparturesAdapter {
    client: EfaClient,
}

impl EfaDeparturesAdapter {
    /// Create an adapter for the EFA instance at `config.base_url`
    pub fn new(config: &ApiConfig) -> Result<Self, ApplicationError> {
        Ok(Self::from_client(EfaClient::new(config).map_err(map_api_error)?))
    }

    /// Wrap an existing client
    #[must_use]
    pub const fn from_client(client: EfaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeparturesPort for EfaDeparturesAdapter {
    #[instrument(skip(self), fields(stop_id = %query.stop_id))]
    async fn stop_times(&self, query: &StopTimesQuery) -> Result<Vec<Departure>, ApplicationError> {
        self.client
            .departures(&query.stop_id, query.count)
            .await
            .map_err(map_api_error)
    }

    #[instrument(skip(self))]
    async fn search_stops(&self, query: &str) -> Result<Vec<Stop>, ApplicationError> {
        self.client.search_stops(query).await.map_err(map_api_error)
    }

    #[instrument(skip(self))]
    async fn lines_at_stop(&self, stop_id: &str) -> Result<Vec<Line>, ApplicationError> {
        self.client.lines_at_stop(stop_id).await.map_err(map_api_error)
    }

    async fn stops_near(
        &self,
        location: &GeoLocation,
        radius_m: u32,
    ) -> Result<Vec<Stop>, ApplicationError> {
        debug!(%location, radius_m, "No area stop search on EFA");
        Ok(Vec::new())
    }
}
