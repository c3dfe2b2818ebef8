//! Plain-text rendering of stops, lines, hubs and sensor states

use application::{HubConfig, SensorState, slot_keys};
use chrono::{DateTime, Local, Utc};
use domain::{Line, Stop};
use serde_json::Value;

/// `HH:MM` in local time, `--:--` when unknown
pub fn clock(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "--:--".to_string(),
        |t| t.with_timezone(&Local).format("%H:%M").to_string(),
    )
}

fn attribute_time(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// One slot as `HH:MM`, with the estimate in brackets when it differs
fn slot(state: &SensorState, index: usize) -> Option<String> {
    let (planned_key, estimated_key) = slot_keys(index);
    let planned = attribute_time(state.attributes.get(&planned_key));
    let estimated = attribute_time(state.attributes.get(&estimated_key));

    match (planned, estimated) {
        (None, None) => None,
        (Some(p), Some(e)) if p != e => Some(format!("{} ({})", clock(Some(p)), clock(Some(e)))),
        (p, e) => Some(clock(p.or(e))),
    }
}

/// One line per sensor: name, next departure, upcoming slots
pub fn sensor_line(state: &SensorState, slots: usize) -> String {
    let upcoming: Vec<String> = (0..slots).filter_map(|i| slot(state, i)).collect();
    let upcoming = if upcoming.is_empty() {
        "no departures".to_string()
    } else {
        upcoming.join(", ")
    };
    format!("{:<40} {}  [{}]", state.name, clock(state.value), upcoming)
}

/// `id  name  (lat, lon)`
pub fn stop_line(stop: &Stop) -> String {
    match &stop.location {
        Some(location) => format!("{:<30} {}  ({location})", stop.id, stop.name),
        None => format!("{:<30} {}", stop.id, stop.name),
    }
}

/// `unique id  label  mode`
pub fn line_line(line: &Line) -> String {
    format!(
        "{:<50} {:<40} {}",
        line.unique_id(),
        line.label(),
        line.mode.label_de()
    )
}

/// Hub summary with its lines
pub fn hub_block(hub: &HubConfig) -> String {
    let mut out = format!(
        "{} ({}, {})\n  stop: {} [{}]\n  api:  {}\n",
        hub.hub_name,
        hub.backend,
        if hub.lines.len() == 1 {
            "1 line".to_string()
        } else {
            format!("{} lines", hub.lines.len())
        },
        hub.stop_name,
        hub.stop_ids.join(", "),
        hub.api_url,
    );
    for line in &hub.lines {
        out.push_str(&format!("  - {}\n", line.label()));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use domain::TransportMode;
    use serde_json::{Map, json};

    use super::*;

    fn state(attributes: Map<String, Value>) -> SensorState {
        SensorState {
            name: "Plärrer-U1-Fürth Hardhöhe".into(),
            unique_id: "vgn:U1-SUBWAY-1".into(),
            icon: "mdi:subway",
            value: None,
            attributes,
        }
    }

    #[test]
    fn unknown_clock() {
        assert_eq!(clock(None), "--:--");
    }

    #[test]
    fn clock_formats_local_time() {
        let t = Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap();
        assert_eq!(clock(Some(t)), t.with_timezone(&Local).format("%H:%M").to_string());
    }

    #[test]
    fn sensor_without_departures() {
        let line = sensor_line(&state(Map::new()), 5);
        assert!(line.starts_with("Plärrer-U1-Fürth Hardhöhe"));
        assert!(line.contains("--:--"));
        assert!(line.ends_with("[no departures]"));
    }

    #[test]
    fn sensor_shows_estimate_when_different() {
        let planned = Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap();
        let estimated = Utc.with_ymd_and_hms(2025, 3, 14, 8, 2, 0).unwrap();
        let attributes = json!({
            "planned_departure_time": planned.to_rfc3339(),
            "estimated_departure_time": estimated.to_rfc3339(),
            "planned_departure_time_1": planned.to_rfc3339(),
            "estimated_departure_time_1": null,
        });
        let Value::Object(attributes) = attributes else {
            unreachable!()
        };

        let line = sensor_line(&state(attributes), 5);
        assert!(line.contains(&format!(
            "{} ({}), {}",
            clock(Some(planned)),
            clock(Some(estimated)),
            clock(Some(planned))
        )));
    }

    #[test]
    fn hub_summary_lists_lines() {
        let hub = HubConfig::new(
            application::Backend::Motis,
            "https://api.transitous.org/api",
            vec!["de:09564:704".into()],
            "Plärrer",
            "Home",
        )
        .with_lines(vec![Line::new(
            "vgn:U1",
            "1",
            "Fürth Hardhöhe",
            "U1",
            TransportMode::Subway,
        )]);

        let block = hub_block(&hub);
        assert!(block.starts_with("Home (motis, 1 line)"));
        assert!(block.contains("  - U1 - Fürth Hardhöhe"));
    }

    #[test]
    fn stop_without_location() {
        let stop = Stop::new("de:09564:704", "Plärrer");
        assert!(stop_line(&stop).ends_with("Plärrer"));
    }
}
