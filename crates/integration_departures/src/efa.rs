//! EFA client (rapidJSON output)
//!
//! EFA ("Elektronische Fahrplanauskunft") instances are run by many German
//! transit associations. Their line ids embed the timetable year
//! (`van:02067: :R:j25`), which is why lines are matched year-insensitively
//! further up.
//!
//! Requests used:
//! - `XML_DM_REQUEST`: departure monitor for one stop
//! - `XML_STOPFINDER_REQUEST`: stop search by name
//! - `XML_SERVINGLINES_REQUEST`: lines serving a stop

use chrono::{DateTime, Utc};
use domain::{Departure, Line, Stop, TransportMode, filter_identical_departures, unique_lines};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::cache::LookupCache;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{ApiClient, QueryParams, query};

const DEPARTURE_MONITOR: &str = "XML_DM_REQUEST";
const STOP_FINDER: &str = "XML_STOPFINDER_REQUEST";
const SERVING_LINES: &str = "XML_SERVINGLINES_REQUEST";

/// Known EFA instances as `(name, base URL)`
pub const EFA_ENDPOINTS: &[(&str, &str)] = &[
    ("bahnland-bayern", "https://bahnland-bayern.de/efa"),
    ("mvv", "https://efa.mvv-muenchen.de/ng"),
    ("vgn", "https://efa.vgn.de/vgnExt_oeffi"),
    ("vvs", "https://www3.vvs.de/mngvvs"),
];

/// Base URL of a known EFA instance, matched case-insensitively
#[must_use]
pub fn efa_endpoint(name: &str) -> Option<&'static str> {
    let name = name.trim();
    EFA_ENDPOINTS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, url)| *url)
}

/// Map an EFA product class to a transport mode
#[must_use]
pub const fn mode_from_product_class(class: i32) -> TransportMode {
    match class {
        0 => TransportMode::Rail,
        1 => TransportMode::Suburban,
        2 => TransportMode::Subway,
        3 => TransportMode::Metro,
        4 => TransportMode::Tram,
        5 | 6 => TransportMode::Bus,
        7 => TransportMode::Coach,
        8 => TransportMode::CableCar,
        9 => TransportMode::Ferry,
        10 => TransportMode::Odm,
        _ => TransportMode::Other,
    }
}

/// Client for one EFA instance
#[derive(Debug, Clone)]
pub struct EfaClient {
    api: ApiClient,
    stop_cache: LookupCache<Vec<Stop>>,
    line_cache: LookupCache<Vec<Line>>,
}

impl EfaClient {
    /// Create a new EFA client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            api: ApiClient::new(config)?,
            stop_cache: LookupCache::from_config(config),
            line_cache: LookupCache::from_config(config),
        })
    }

    fn base_params() -> QueryParams {
        query([
            ("outputFormat", "rapidJSON"),
            ("coordOutputFormat", "WGS84[dd.ddddd]"),
        ])
    }

    /// Next `limit` departures at `stop_id`
    #[instrument(skip(self))]
    pub async fn departures(&self, stop_id: &str, limit: u32) -> Result<Vec<Departure>, ApiError> {
        if stop_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("stop id must not be empty".to_string()));
        }

        let mut params = Self::base_params();
        params.extend(query([
            ("mode", "direct".to_string()),
            ("name_dm", stop_id.to_string()),
            ("type_dm", "stop".to_string()),
            ("depType", "stopEvents".to_string()),
            ("useRealtime", "1".to_string()),
            ("limit", limit.to_string()),
        ]));

        let body = self.api.get_default(DEPARTURE_MONITOR, &params).await?;
        let departures = filter_identical_departures(parse_stop_events(body)?);
        debug!(count = departures.len(), "Received departures");
        Ok(departures)
    }

    /// Stops whose name matches `name`
    #[instrument(skip(self))]
    pub async fn search_stops(&self, name: &str) -> Result<Vec<Stop>, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidRequest(
                "search text must not be empty".to_string(),
            ));
        }

        let cache_key = name.to_lowercase();
        if let Some(stops) = self.stop_cache.get(&cache_key).await {
            return Ok(stops);
        }

        let mut params = Self::base_params();
        params.extend(query([
            ("type_sf", "any"),
            ("name_sf", name),
            ("anyObjFilter_sf", "2"),
        ]));

        let body = self.api.get_default(STOP_FINDER, &params).await?;
        let stops = parse_locations(body)?;
        self.stop_cache.insert(cache_key, stops.clone()).await;
        Ok(stops)
    }

    /// Lines serving `stop_id`, one per line and destination
    #[instrument(skip(self))]
    pub async fn lines_at_stop(&self, stop_id: &str) -> Result<Vec<Line>, ApiError> {
        if let Some(lines) = self.line_cache.get(stop_id).await {
            return Ok(lines);
        }

        let mut params = Self::base_params();
        params.extend(query([
            ("mode", "odv"),
            ("type_sl", "stopID"),
            ("name_sl", stop_id),
            ("lineReqType", "1"),
        ]));

        let body = self.api.get_default(SERVING_LINES, &params).await?;
        let lines = unique_lines(parse_lines(body)?);
        self.line_cache
            .insert(stop_id.to_string(), lines.clone())
            .await;
        Ok(lines)
    }
}

// --- Raw API response types for deserialization ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDepartureMonitor {
    #[serde(default)]
    stop_events: Vec<RawStopEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStopEvent {
    location: Option<RawLocation>,
    departure_time_planned: Option<DateTime<Utc>>,
    departure_time_estimated: Option<DateTime<Utc>>,
    transportation: RawTransportation,
    #[serde(default)]
    is_cancelled: bool,
}

#[derive(Debug, Deserialize)]
struct RawTransportation {
    id: String,
    #[serde(default)]
    number: String,
    #[serde(default)]
    product: Option<RawProduct>,
    destination: RawDestination,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    class: i32,
}

#[derive(Debug, Deserialize)]
struct RawDestination {
    #[serde(default)]
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    id: String,
    name: String,
    #[serde(default)]
    coord: Option<Vec<f64>>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    parent: Option<Box<RawLocation>>,
}

#[derive(Debug, Deserialize)]
struct RawStopFinder {
    #[serde(default)]
    locations: Vec<RawLocation>,
}

#[derive(Debug, Deserialize)]
struct RawServingLines {
    #[serde(default)]
    lines: Vec<RawTransportation>,
}

fn malformed(err: &serde_json::Error) -> ApiError {
    ApiError::MalformedResponse(err.to_string())
}

fn product_mode(product: Option<&RawProduct>) -> TransportMode {
    product.map_or(TransportMode::Other, |p| mode_from_product_class(p.class))
}

/// Map an `XML_DM_REQUEST` body to departures
///
/// EFA uses the destination stop as the direction of a line.
pub fn parse_stop_events(body: Value) -> Result<Vec<Departure>, ApiError> {
    let raw: RawDepartureMonitor = serde_json::from_value(body).map_err(|e| malformed(&e))?;

    Ok(raw
        .stop_events
        .into_iter()
        .map(|event| {
            let mode = product_mode(event.transportation.product.as_ref());
            let stop_id = event
                .location
                .map(|loc| loc.parent.map_or(loc.id, |parent| parent.id));
            Departure {
                route_id: event.transportation.id,
                direction_id: event.transportation.destination.id,
                stop_id,
                trip_id: None,
                planned_time: event.departure_time_planned,
                real_time: event.departure_time_estimated.is_some(),
                estimated_time: event.departure_time_estimated,
                cancelled: event.is_cancelled,
                head_sign: event.transportation.destination.name,
                route_short_name: event.transportation.number,
                mode,
            }
        })
        .collect())
}

/// Map an `XML_STOPFINDER_REQUEST` body to stops (non-stop matches are skipped)
pub fn parse_locations(body: Value) -> Result<Vec<Stop>, ApiError> {
    let raw: RawStopFinder = serde_json::from_value(body).map_err(|e| malformed(&e))?;

    Ok(raw
        .locations
        .into_iter()
        .filter(|loc| loc.kind == "stop")
        .map(|loc| {
            let stop = Stop::new(loc.id, loc.name);
            match loc.coord.as_deref() {
                Some([lat, lon, ..]) => stop.with_coords(*lat, *lon),
                _ => stop,
            }
        })
        .collect())
}

/// Map an `XML_SERVINGLINES_REQUEST` body to lines
pub fn parse_lines(body: Value) -> Result<Vec<Line>, ApiError> {
    let raw: RawServingLines = serde_json::from_value(body).map_err(|e| malformed(&e))?;

    Ok(raw
        .lines
        .into_iter()
        .map(|line| {
            let mode = product_mode(line.product.as_ref());
            Line::new(
                line.id,
                line.destination.id,
                line.destination.name,
                line.number,
                mode,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn known_endpoints_resolve() {
        assert_eq!(efa_endpoint("VGN"), Some("https://efa.vgn.de/vgnExt_oeffi"));
        assert_eq!(efa_endpoint(" bahnland-bayern "), Some("https://bahnland-bayern.de/efa"));
        assert_eq!(efa_endpoint("hafas"), None);
        for (_, url) in EFA_ENDPOINTS {
            assert!(ApiConfig::with_base_url(*url).validate().is_ok());
        }
    }

    fn stop_event(line_id: &str, planned: &str, estimated: Option<&str>) -> Value {
        let mut event = json!({
            "location": {
                "id": "de:09564:704:11:1",
                "name": "Plärrer",
                "type": "platform",
                "parent": { "id": "de:09564:704", "name": "Plärrer", "type": "stop" }
            },
            "departureTimePlanned": planned,
            "transportation": {
                "id": line_id,
                "name": "Bus 67",
                "number": "67",
                "product": { "id": 5, "class": 5, "name": "Bus" },
                "destination": { "id": "3000510", "name": "Hauptbahnhof" }
            }
        });
        if let Some(est) = estimated {
            event["departureTimeEstimated"] = json!(est);
        }
        event
    }

    #[test]
    fn product_classes() {
        assert_eq!(mode_from_product_class(0), TransportMode::Rail);
        assert_eq!(mode_from_product_class(1), TransportMode::Suburban);
        assert_eq!(mode_from_product_class(2), TransportMode::Subway);
        assert_eq!(mode_from_product_class(4), TransportMode::Tram);
        assert_eq!(mode_from_product_class(5), TransportMode::Bus);
        assert_eq!(mode_from_product_class(6), TransportMode::Bus);
        assert_eq!(mode_from_product_class(7), TransportMode::Coach);
        assert_eq!(mode_from_product_class(99), TransportMode::Other);
    }

    #[test]
    fn parses_stop_events() {
        let body = json!({
            "version": "10.6.14.22",
            "stopEvents": [
                stop_event("van:02067: :R:j25", "2025-03-14T08:00:00Z", Some("2025-03-14T08:03:00Z")),
                stop_event("van:02067: :R:j25", "2025-03-14T08:20:00Z", None)
            ]
        });
        let departures = parse_stop_events(body).unwrap();

        assert_eq!(departures.len(), 2);
        let first = &departures[0];
        assert_eq!(first.route_id, "van:02067: :R:j25");
        assert_eq!(first.direction_id, "3000510");
        assert_eq!(first.stop_id.as_deref(), Some("de:09564:704"));
        assert_eq!(first.mode, TransportMode::Bus);
        assert_eq!(first.route_short_name, "67");
        assert_eq!(first.head_sign, "Hauptbahnhof");
        assert!(first.real_time);
        assert_eq!(
            first.estimated_time,
            Some(Utc.with_ymd_and_hms(2025, 3, 14, 8, 3, 0).unwrap())
        );
        assert!(!departures[1].real_time);
        assert_eq!(departures[1].estimated_time, None);
    }

    #[test]
    fn empty_departure_monitor() {
        let departures = parse_stop_events(json!({ "version": "10" })).unwrap();
        assert!(departures.is_empty());
    }

    #[test]
    fn stop_event_without_transportation_is_malformed() {
        let body = json!({ "stopEvents": [{ "departureTimePlanned": "2025-03-14T08:00:00Z" }] });
        assert!(matches!(
            parse_stop_events(body),
            Err(ApiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn parses_stop_finder_locations() {
        let body = json!({
            "locations": [
                { "id": "de:09564:704", "name": "Nürnberg, Plärrer", "type": "stop", "coord": [49.4478, 11.0629] },
                { "id": "streetID:1500", "name": "Plärrer (Straße)", "type": "street" }
            ]
        });
        let stops = parse_locations(body).unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].id, "de:09564:704");
        let location = stops[0].location.unwrap();
        assert!((location.latitude() - 49.4478).abs() < 1e-9);
    }

    #[test]
    fn parses_serving_lines() {
        let body = json!({
            "lines": [
                {
                    "id": "van:02067: :R:j25",
                    "name": "Bus 67",
                    "number": "67",
                    "product": { "id": 5, "class": 5, "name": "Bus" },
                    "destination": { "id": "3000510", "name": "Hauptbahnhof" }
                },
                {
                    "id": "vgn:11001: :H:j25",
                    "name": "U-Bahn U1",
                    "number": "U1",
                    "product": { "id": 2, "class": 2, "name": "U-Bahn" },
                    "destination": { "id": "3000701", "name": "Fürth Hardhöhe" }
                }
            ]
        });
        let lines = parse_lines(body).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].route_short_name, "67");
        assert_eq!(lines[0].direction_id, "3000510");
        assert_eq!(lines[1].mode, TransportMode::Subway);
        assert_eq!(lines[1].head_sign, "Fürth Hardhöhe");
    }
}
