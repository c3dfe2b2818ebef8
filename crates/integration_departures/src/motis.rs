//! Motis client
//!
//! Talks to a [Motis](https://github.com/motis-project/motis) instance such
//! as the public Transitous API. Only the read-only lookups needed for a
//! departure board are wrapped: stop times at a stop, stop search and stops
//! inside a box around a coordinate.

use chrono::{DateTime, Utc};
use domain::{Departure, GeoLocation, Line, Stop, TransportMode, unique_lines};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::cache::LookupCache;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{ApiClient, query};

/// Motis endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotisCommand {
    /// Stops inside a bounding box
    Stops,
    /// Departures at a stop
    StopTimes,
    /// Free-text location search
    Geocode,
}

impl MotisCommand {
    /// Path relative to the API base URL
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Stops => "v1/map/stops",
            Self::StopTimes => "v5/stoptimes",
            Self::Geocode => "v1/geocode",
        }
    }
}

/// Client for one Motis instance
#[derive(Debug, Clone)]
pub struct MotisClient {
    api: ApiClient,
    stop_cache: LookupCache<Vec<Stop>>,
}

impl MotisClient {
    /// Create a new Motis client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::with_api(ApiClient::new(config)?, config))
    }

    /// Wrap an existing API client
    #[must_use]
    pub fn with_api(api: ApiClient, config: &ApiConfig) -> Self {
        Self {
            api,
            stop_cache: LookupCache::from_config(config),
        }
    }

    /// The underlying fetch wrapper
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Next `count` departures at `stop_id`, including stops within `radius_m`
    #[instrument(skip(self))]
    pub async fn stop_times(
        &self,
        stop_id: &str,
        count: u32,
        radius_m: Option<u32>,
    ) -> Result<Vec<Departure>, ApiError> {
        if stop_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("stop id must not be empty".to_string()));
        }

        let mut params = query([("stopId", stop_id.to_string()), ("n", count.to_string())]);
        if let Some(radius) = radius_m {
            params.push(("radius".to_string(), radius.to_string()));
        }

        debug!(?params, "Fetching stop times");
        let body = self
            .api
            .get_default(MotisCommand::StopTimes.path(), &params)
            .await?;

        let departures = parse_stop_times(body)?;
        debug!(count = departures.len(), "Received stop times");
        Ok(departures)
    }

    /// Stops whose name matches `text`
    #[instrument(skip(self))]
    pub async fn search_stops(&self, text: &str) -> Result<Vec<Stop>, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::InvalidRequest(
                "search text must not be empty".to_string(),
            ));
        }

        let cache_key = format!("geocode:{}", text.to_lowercase());
        if let Some(stops) = self.stop_cache.get(&cache_key).await {
            return Ok(stops);
        }

        let params = query([("text", text), ("type", "STOP")]);
        let body = self
            .api
            .get_default(MotisCommand::Geocode.path(), &params)
            .await?;
        let stops = parse_matches(body)?;

        debug!(count = stops.len(), "Stops found");
        self.stop_cache.insert(cache_key, stops.clone()).await;
        Ok(stops)
    }

    /// Stops inside a box extending `radius_m` around `center`
    #[instrument(skip(self), fields(center = %center))]
    pub async fn stops_around(
        &self,
        center: &GeoLocation,
        radius_m: f64,
    ) -> Result<Vec<Stop>, ApiError> {
        let (south_west, north_east) = center.bounding_box(radius_m);

        // Motis names the upper-right corner `min` and the lower-left one `max`
        let params = query([
            ("min", north_east.to_query_value()),
            ("max", south_west.to_query_value()),
        ]);
        let body = self
            .api
            .get_default(MotisCommand::Stops.path(), &params)
            .await?;

        let stops = parse_places(body)?;
        debug!(count = stops.len(), "Stops around location");
        Ok(stops)
    }

    /// Lines seen in the next `window` departures at `stop_id`
    ///
    /// Motis has no line catalogue per stop, so lines are derived from an
    /// upcoming departure window.
    #[instrument(skip(self))]
    pub async fn lines_at_stop(
        &self,
        stop_id: &str,
        window: u32,
        radius_m: Option<u32>,
    ) -> Result<Vec<Line>, ApiError> {
        let departures = self.stop_times(stop_id, window, radius_m).await?;
        let lines = unique_lines(departures.iter().map(Line::from_departure).collect());
        debug!(count = lines.len(), "Lines discovered");
        Ok(lines)
    }
}

// --- Raw API response types for deserialization ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStopTimesResponse {
    stop_times: Vec<RawStopTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStopTime {
    place: RawPlace,
    mode: String,
    #[serde(default)]
    real_time: bool,
    #[serde(default)]
    headsign: String,
    #[serde(default)]
    route_short_name: String,
    route_id: String,
    direction_id: String,
    trip_id: Option<String>,
    #[serde(default)]
    cancelled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlace {
    #[serde(default)]
    name: String,
    stop_id: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    departure: Option<DateTime<Utc>>,
    scheduled_departure: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    id: String,
    name: String,
    lat: f64,
    lon: f64,
}

fn malformed(err: &serde_json::Error) -> ApiError {
    ApiError::MalformedResponse(err.to_string())
}

/// Map a `v5/stoptimes` body to departures
///
/// The estimated time is only set when Motis reports real-time data for
/// the trip; otherwise `departure` just repeats the schedule.
pub fn parse_stop_times(body: Value) -> Result<Vec<Departure>, ApiError> {
    let raw: RawStopTimesResponse = serde_json::from_value(body).map_err(|e| malformed(&e))?;

    Ok(raw
        .stop_times
        .into_iter()
        .map(|st| Departure {
            route_id: st.route_id,
            direction_id: st.direction_id,
            stop_id: st.place.stop_id,
            trip_id: st.trip_id,
            planned_time: st.place.scheduled_departure,
            estimated_time: if st.real_time { st.place.departure } else { None },
            real_time: st.real_time,
            cancelled: st.cancelled,
            head_sign: st.headsign,
            route_short_name: st.route_short_name,
            mode: TransportMode::from_motis(&st.mode),
        })
        .collect())
}

/// Map a `v1/map/stops` body to stops
pub fn parse_places(body: Value) -> Result<Vec<Stop>, ApiError> {
    let raw: Vec<RawPlace> = serde_json::from_value(body).map_err(|e| malformed(&e))?;

    Ok(raw
        .into_iter()
        .filter_map(|place| {
            let id = place.stop_id?;
            let stop = Stop::new(id, place.name);
            Some(match (place.lat, place.lon) {
                (Some(lat), Some(lon)) => stop.with_coords(lat, lon),
                _ => stop,
            })
        })
        .collect())
}

/// Map a `v1/geocode` body to stops
pub fn parse_matches(body: Value) -> Result<Vec<Stop>, ApiError> {
    let raw: Vec<RawMatch> = serde_json::from_value(body).map_err(|e| malformed(&e))?;

    Ok(raw
        .into_iter()
        .map(|m| Stop::new(m.id, m.name).with_coords(m.lat, m.lon))
        .collect())
}
