//! Poll cycle for one hub
//!
//! The coordinator queries the hub's first stop id once per refresh and keeps
//! the filtered result until the next successful poll.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{Departure, dedupe_scheduled};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{DeparturesPort, StopTimesQuery};

/// Default number of departures requested per tracked line
pub const DEFAULT_TIMES_PER_LINE: u32 = 5;

/// Default radius around the stop in meters
pub const DEFAULT_STOP_RADIUS_M: u32 = 100;

/// Request sizing for a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Departures requested per tracked line
    #[serde(default = "default_times_per_line")]
    pub times_per_line: u32,
    /// Include nearby platforms within this radius, if set
    #[serde(default = "default_radius")]
    pub radius_m: Option<u32>,
}

const fn default_times_per_line() -> u32 {
    DEFAULT_TIMES_PER_LINE
}

#[allow(clippy::unnecessary_wraps)]
const fn default_radius() -> Option<u32> {
    Some(DEFAULT_STOP_RADIUS_M)
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            times_per_line: default_times_per_line(),
            radius_m: default_radius(),
        }
    }
}

impl PollSettings {
    /// Number of departures to request for `line_count` tracked lines
    #[must_use]
    pub fn request_count(&self, line_count: usize) -> u32 {
        let lines = u32::try_from(line_count.max(1)).unwrap_or(u32::MAX);
        self.times_per_line.max(1).saturating_mul(lines)
    }
}

/// Fetches and holds the departures of one hub
pub struct DeparturesCoordinator {
    port: Arc<dyn DeparturesPort>,
    stop_ids: Vec<String>,
    line_count: usize,
    settings: PollSettings,
    data: Vec<Departure>,
    last_update_success: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for DeparturesCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeparturesCoordinator")
            .field("stop_ids", &self.stop_ids)
            .field("line_count", &self.line_count)
            .field("settings", &self.settings)
            .field("departures", &self.data.len())
            .field("last_update_success", &self.last_update_success)
            .finish_non_exhaustive()
    }
}

impl DeparturesCoordinator {
    /// Create a coordinator for the given stop ids
    #[must_use]
    pub fn new(
        port: Arc<dyn DeparturesPort>,
        stop_ids: Vec<String>,
        line_count: usize,
        settings: PollSettings,
    ) -> Self {
        Self {
            port,
            stop_ids,
            line_count,
            settings,
            data: Vec::new(),
            last_update_success: false,
            last_updated: None,
        }
    }

    /// Configured stop ids
    #[must_use]
    pub fn stop_ids(&self) -> &[String] {
        &self.stop_ids
    }

    /// Number of tracked lines
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.line_count
    }

    /// Change the number of tracked lines (after an options update)
    pub fn set_line_count(&mut self, line_count: usize) {
        self.line_count = line_count;
    }

    /// Departures of the last successful poll
    #[must_use]
    pub fn data(&self) -> &[Departure] {
        &self.data
    }

    /// Whether the most recent poll succeeded
    #[must_use]
    pub const fn last_update_success(&self) -> bool {
        self.last_update_success
    }

    /// Time of the last successful poll
    #[must_use]
    pub const fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Run one poll cycle
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::UpdateFailed` when the backend request fails
    /// or no stop id is configured. Data from the previous poll is kept.
    #[instrument(skip(self), fields(stop_id = self.stop_ids.first().map(String::as_str)))]
    pub async fn refresh(&mut self) -> Result<&[Departure], ApplicationError> {
        match self.fetch().await {
            Ok(departures) => {
                info!(count = departures.len(), "Departures updated");
                self.data = departures;
                self.last_update_success = true;
                self.last_updated = Some(Utc::now());
                Ok(&self.data)
            },
            Err(e) => {
                warn!(error = %e, "Departure update failed");
                self.last_update_success = false;
                Err(ApplicationError::UpdateFailed(e.to_string()))
            },
        }
    }

    async fn fetch(&self) -> Result<Vec<Departure>, ApplicationError> {
        let stop_id = self
            .stop_ids
            .first()
            .ok_or_else(|| ApplicationError::Configuration("no stop id configured".into()))?;

        let query = StopTimesQuery::new(stop_id, self.settings.request_count(self.line_count))
            .with_radius(self.settings.radius_m);
        debug!(count = query.count, radius = ?query.radius_m, "Requesting stop times");

        let departures = self.port.stop_times(&query).await?;
        let received = departures.len();

        let kept: Vec<Departure> = departures
            .into_iter()
            .filter(|d| {
                d.stop_id
                    .as_ref()
                    .is_none_or(|id| self.stop_ids.iter().any(|s| s == id))
            })
            .collect();
        let kept = dedupe_scheduled(kept, |d| {
            (
                d.route_id.clone(),
                d.direction_id.clone(),
                d.trip_id.clone(),
            )
        });

        debug!(received, kept = kept.len(), "Filtered stop times");
        Ok(kept)
    }
}
