//! Departure entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stabilizer::DepartureReading;
use crate::value_objects::{LineKey, TransportMode};

/// One upcoming departure of a line at a stop, as reported by a backend
///
/// Either timestamp may be missing on a given poll; real-time feeds drop
/// fields intermittently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    /// Route (line) identifier
    pub route_id: String,
    /// Direction identifier
    pub direction_id: String,
    /// Stop the vehicle departs from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
    /// Trip identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    /// Scheduled departure time
    #[serde(default)]
    pub planned_time: Option<DateTime<Utc>>,
    /// Real-time estimated departure time
    #[serde(default)]
    pub estimated_time: Option<DateTime<Utc>>,
    /// Whether the backend had real-time data for this departure
    #[serde(default)]
    pub real_time: bool,
    /// Whether the trip is cancelled
    #[serde(default)]
    pub cancelled: bool,
    /// Destination shown on the vehicle
    #[serde(default)]
    pub head_sign: String,
    /// Short public line name
    #[serde(default)]
    pub route_short_name: String,
    /// Transport mode
    pub mode: TransportMode,
}

impl Departure {
    /// Create a departure with only its line identity set
    #[must_use]
    pub fn new(route_id: impl Into<String>, direction_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            direction_id: direction_id.into(),
            stop_id: None,
            trip_id: None,
            planned_time: None,
            estimated_time: None,
            real_time: false,
            cancelled: false,
            head_sign: String::new(),
            route_short_name: String::new(),
            mode: TransportMode::Other,
        }
    }

    /// Set the scheduled time
    #[must_use]
    pub fn with_planned(mut self, planned: DateTime<Utc>) -> Self {
        self.planned_time = Some(planned);
        self
    }

    /// Set the estimated time
    #[must_use]
    pub fn with_estimated(mut self, estimated: DateTime<Utc>) -> Self {
        self.estimated_time = Some(estimated);
        self.real_time = true;
        self
    }

    /// Set the departure stop
    #[must_use]
    pub fn at_stop(mut self, stop_id: impl Into<String>) -> Self {
        self.stop_id = Some(stop_id.into());
        self
    }

    /// Set the trip id
    #[must_use]
    pub fn with_trip(mut self, trip_id: impl Into<String>) -> Self {
        self.trip_id = Some(trip_id.into());
        self
    }

    /// Set the display fields
    #[must_use]
    pub fn with_display(
        mut self,
        route_short_name: impl Into<String>,
        head_sign: impl Into<String>,
        mode: TransportMode,
    ) -> Self {
        self.route_short_name = route_short_name.into();
        self.head_sign = head_sign.into();
        self.mode = mode;
        self
    }

    /// The line this departure belongs to
    #[must_use]
    pub fn line_key(&self) -> LineKey {
        LineKey::new(&self.route_id, &self.direction_id)
    }

    /// The line id used for year-fuzzy matching
    #[must_use]
    pub fn line_id(&self) -> &str {
        &self.route_id
    }

    /// The timing fields of this departure
    #[must_use]
    pub const fn reading(&self) -> DepartureReading {
        DepartureReading {
            planned_time: self.planned_time,
            estimated_time: self.estimated_time,
        }
    }

    /// Best known departure time: estimated if known, else planned
    #[must_use]
    pub fn best_time(&self) -> Option<DateTime<Utc>> {
        self.estimated_time.or(self.planned_time)
    }

    /// Delay in whole minutes, when both times are known
    #[must_use]
    pub fn delay_minutes(&self) -> Option<i64> {
        match (self.planned_time, self.estimated_time) {
            (Some(planned), Some(estimated)) => Some((estimated - planned).num_minutes()),
            _ => None,
        }
    }
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self
            .best_time()
            .map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
        write!(f, "{time} {} → {}", self.route_short_name, self.head_sign)?;
        match self.delay_minutes() {
            Some(delay) if delay > 0 => write!(f, " (+{delay})"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    #[test]
    fn best_time_prefers_estimated() {
        let dep = Departure::new("r", "d")
            .with_planned(at(8, 0))
            .with_estimated(at(8, 3));
        assert_eq!(dep.best_time(), Some(at(8, 3)));
    }

    #[test]
    fn best_time_falls_back_to_planned() {
        let dep = Departure::new("r", "d").with_planned(at(8, 0));
        assert_eq!(dep.best_time(), Some(at(8, 0)));
        assert!(!dep.real_time);
    }

    #[test]
    fn delay_minutes() {
        let dep = Departure::new("r", "d")
            .with_planned(at(8, 0))
            .with_estimated(at(8, 4));
        assert_eq!(dep.delay_minutes(), Some(4));
        assert_eq!(Departure::new("r", "d").delay_minutes(), None);
    }

    #[test]
    fn reading_copies_times() {
        let dep = Departure::new("r", "d").with_estimated(at(9, 15));
        let reading = dep.reading();
        assert_eq!(reading.planned_time, None);
        assert_eq!(reading.estimated_time, Some(at(9, 15)));
    }

    #[test]
    fn display_with_delay() {
        let dep = Departure::new("r", "d")
            .with_display("U1", "Langwasser Süd", TransportMode::Subway)
            .with_planned(at(8, 0))
            .with_estimated(at(8, 2));
        assert_eq!(dep.to_string(), "08:02 U1 → Langwasser Süd (+2)");
    }

    #[test]
    fn display_without_times() {
        let dep = Departure::new("r", "d").with_display("4", "Gibitzenhof", TransportMode::Tram);
        assert_eq!(dep.to_string(), "--:-- 4 → Gibitzenhof");
    }
}
