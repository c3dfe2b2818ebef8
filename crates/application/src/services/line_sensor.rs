//! Per-line departure sensor
//!
//! A sensor publishes the next departure of one tracked line as its value and
//! the next five departures as stabilized attributes.

use chrono::{DateTime, Utc};
use domain::{Departure, DepartureStabilizer, EstimatedTimePolicy, Line, replace_year_token};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Number of departure slots published per line
pub const DEPARTURE_SLOTS: usize = 5;

const ATTR_PLANNED: &str = "planned_departure_time";
const ATTR_ESTIMATED: &str = "estimated_departure_time";
const ATTR_LINE_NAME: &str = "line_name";
const ATTR_LINE_ID: &str = "line_id";
const ATTR_TRANSPORT_TYPE: &str = "transport_type";
const ATTR_DIRECTION: &str = "direction";

/// Attribute keys `(planned, estimated)` of slot `index`
#[must_use]
pub fn slot_keys(index: usize) -> (String, String) {
    if index == 0 {
        (ATTR_PLANNED.to_string(), ATTR_ESTIMATED.to_string())
    } else {
        (
            format!("{ATTR_PLANNED}_{index}"),
            format!("{ATTR_ESTIMATED}_{index}"),
        )
    }
}

/// Serializable snapshot of a sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    /// Display name, `{stop}-{line}-{destination}`
    pub name: String,
    /// Stable id of the tracked line
    pub unique_id: String,
    /// mdi icon
    pub icon: &'static str,
    /// Next departure, estimated time preferred
    pub value: Option<DateTime<Utc>>,
    /// Static line attributes and the departure slots
    pub attributes: Map<String, Value>,
}

/// Sensor for one tracked line
#[derive(Debug, Clone)]
pub struct LineSensor {
    line: Line,
    name: String,
    slots: Vec<DepartureStabilizer>,
    value: Option<DateTime<Utc>>,
}

impl LineSensor {
    /// Create a sensor for `line` at the stop named `stop_name`
    #[must_use]
    pub fn new(stop_name: &str, line: Line) -> Self {
        Self::with_policy(stop_name, line, EstimatedTimePolicy::default())
    }

    /// Create a sensor with a specific estimated-time policy
    #[must_use]
    pub fn with_policy(stop_name: &str, line: Line, policy: EstimatedTimePolicy) -> Self {
        let name = format!("{stop_name}-{}-{}", line.route_short_name, line.head_sign);
        let slots = (0..DEPARTURE_SLOTS)
            .map(|i| {
                let (planned, estimated) = slot_keys(i);
                DepartureStabilizer::new(planned, estimated).with_policy(policy)
            })
            .collect();

        Self {
            line,
            name,
            slots,
            value: None,
        }
    }

    /// Tracked line
    #[must_use]
    pub const fn line(&self) -> &Line {
        &self.line
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable id
    #[must_use]
    pub fn unique_id(&self) -> String {
        self.line.unique_id()
    }

    /// Icon for the line's transport mode
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        self.line.mode.icon()
    }

    /// Next departure time
    #[must_use]
    pub const fn value(&self) -> Option<DateTime<Utc>> {
        self.value
    }

    /// Departure slots, next departure first
    #[must_use]
    pub fn slots(&self) -> &[DepartureStabilizer] {
        &self.slots
    }

    /// Apply a poll's departures
    pub fn handle_update(&mut self, departures: &[Departure]) {
        let matching: Vec<&Departure> = departures
            .iter()
            .filter(|d| self.line.matches(d, false))
            .collect();

        debug!(sensor = %self.name, matching = matching.len(), "Sensor update");

        let Some(first) = matching.first() else {
            self.clear();
            return;
        };
        self.value = first.best_time();

        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.update(matching.get(i).map(|d| d.reading()));
        }
    }

    /// Reset all slots and the value
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.value = None;
    }

    /// Static line attributes
    #[must_use]
    pub fn static_attributes(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            ATTR_LINE_NAME.into(),
            Value::String(self.line.route_short_name.clone()),
        );
        map.insert(
            ATTR_LINE_ID.into(),
            Value::String(replace_year_token(&self.line.route_id, false)),
        );
        map.insert(
            ATTR_TRANSPORT_TYPE.into(),
            Value::String(self.line.mode.label_de().into()),
        );
        map.insert(
            ATTR_DIRECTION.into(),
            Value::String(self.line.head_sign.clone()),
        );
        map
    }

    /// All attributes: static ones followed by every slot
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        let mut map = self.static_attributes();
        for slot in &self.slots {
            map.extend(slot.attributes());
        }
        map
    }

    /// Snapshot of the sensor
    #[must_use]
    pub fn state(&self) -> SensorState {
        SensorState {
            name: self.name.clone(),
            unique_id: self.unique_id(),
            icon: self.icon(),
            value: self.value,
            attributes: self.attributes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use domain::{TransportMode, current_service_year};

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, minute, 0).unwrap()
    }

    fn line() -> Line {
        Line::new(
            "van:02067: :R:j25",
            "de:09564:510",
            "Hauptbahnhof",
            "67",
            TransportMode::Bus,
        )
    }

    fn departure(route: &str, minute: u32) -> Departure {
        Departure::new(route, "de:09564:510").with_planned(at(minute))
    }

    fn sensor() -> LineSensor {
        LineSensor::new("Plärrer", line())
    }

    #[test]
    fn slot_key_names() {
        assert_eq!(
            slot_keys(0),
            ("planned_departure_time".into(), "estimated_departure_time".into())
        );
        assert_eq!(
            slot_keys(4),
            ("planned_departure_time_4".into(), "estimated_departure_time_4".into())
        );
    }

    #[test]
    fn name_and_static_attributes() {
        let sensor = sensor();
        assert_eq!(sensor.name(), "Plärrer-67-Hauptbahnhof");
        assert_eq!(sensor.icon(), "mdi:bus");

        let attrs = sensor.static_attributes();
        assert_eq!(attrs["line_name"], "67");
        assert_eq!(attrs["direction"], "Hauptbahnhof");
        assert_eq!(
            attrs["line_id"],
            format!("van:02067: :R:j{}", current_service_year())
        );
        assert_eq!(attrs["transport_type"], TransportMode::Bus.label_de());
    }

    #[test]
    fn fills_slots_in_order() {
        let mut sensor = sensor();
        let departures = vec![
            departure("van:02067: :R:j24", 1).with_estimated(at(3)),
            departure("van:99999: :R:j25", 2),
            departure("van:02067: :R:j25", 5),
        ];
        sensor.handle_update(&departures);

        assert_eq!(sensor.value(), Some(at(3)));
        let attrs = sensor.attributes();
        assert_eq!(attrs["planned_departure_time"], at(1).to_rfc3339());
        assert_eq!(attrs["estimated_departure_time"], at(3).to_rfc3339());
        assert_eq!(attrs["planned_departure_time_1"], at(5).to_rfc3339());
        assert!(attrs["planned_departure_time_2"].is_null());
        assert_eq!(attrs.len(), 4 + 2 * DEPARTURE_SLOTS);
    }

    #[test]
    fn value_falls_back_to_planned() {
        let mut sensor = sensor();
        sensor.handle_update(&[departure("van:02067: :R:j25", 7)]);
        assert_eq!(sensor.value(), Some(at(7)));
    }

    #[test]
    fn other_direction_is_ignored() {
        let mut sensor = sensor();
        let other = Departure::new("van:02067: :R:j25", "elsewhere").with_planned(at(1));
        sensor.handle_update(&[other]);
        assert_eq!(sensor.value(), None);
    }

    #[test]
    fn clears_all_slots_without_matches() {
        let mut sensor = sensor();
        sensor.handle_update(&[
            departure("van:02067: :R:j25", 1),
            departure("van:02067: :R:j25", 2),
        ]);
        assert!(sensor.value().is_some());

        sensor.handle_update(&[departure("van:11111: :R:j25", 1)]);
        assert_eq!(sensor.value(), None);
        assert!(sensor.slots().iter().all(|s| s.planned_time().is_none()));
        assert!(
            sensor
                .attributes()
                .iter()
                .filter(|(k, _)| k.contains("departure_time"))
                .all(|(_, v)| v.is_null())
        );
    }

    #[test]
    fn missing_planned_time_is_held() {
        let mut sensor = sensor();
        sensor.handle_update(&[departure("van:02067: :R:j25", 1)]);
        sensor.handle_update(&[Departure::new("van:02067: :R:j25", "de:09564:510")]);

        assert_eq!(sensor.slots()[0].planned_time(), Some(at(1)));
        assert_eq!(sensor.slots()[0].none_streak(), 1);
    }

    #[test]
    fn state_snapshot_serializes() {
        let mut sensor = sensor();
        sensor.handle_update(&[departure("van:02067: :R:j25", 1)]);
        let json = serde_json::to_value(sensor.state()).unwrap();
        assert_eq!(json["name"], "Plärrer-67-Hauptbahnhof");
        assert_eq!(json["unique_id"], line().unique_id());
        assert_eq!(json["icon"], "mdi:bus");
        assert_eq!(json["attributes"]["planned_departure_time"], at(1).to_rfc3339());
    }
}
