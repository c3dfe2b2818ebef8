//! Departure-time stabilizer
//!
//! Real-time feeds drop the planned or estimated time of a departure for a
//! single poll now and then. Publishing those gaps directly makes dashboards
//! flicker, so each tracked departure slot keeps its last known planned time
//! until `max_none_values` consecutive readings have come back without one.
//!
//! ```text
//! reading:   08:00  -      -      -      -      -      08:05
//! planned:   08:00  08:00  08:00  08:00  08:00  None   08:05
//! streak:    0      1      2      3      4      0      0
//! ```
//! (with the default threshold of 5)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default number of consecutive missing readings before a time is cleared
pub const MAX_NONE_VALUES: u8 = 5;

/// The timing fields of one poll's snapshot of a departure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepartureReading {
    /// Scheduled departure time, if reported on this poll
    pub planned_time: Option<DateTime<Utc>>,
    /// Estimated departure time, if reported on this poll
    pub estimated_time: Option<DateTime<Utc>>,
}

impl DepartureReading {
    /// Create a reading
    #[must_use]
    pub const fn new(
        planned_time: Option<DateTime<Utc>>,
        estimated_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            planned_time,
            estimated_time,
        }
    }
}

/// How the estimated time is carried across polls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedTimePolicy {
    /// Take the estimated time from every reading as-is, gaps included
    #[default]
    Passthrough,
    /// Hold the estimated time across gaps, with its own miss counter
    Stabilized,
}

/// One time field with its run of consecutive misses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HeldTime {
    value: Option<DateTime<Utc>>,
    none_streak: u8,
}

impl HeldTime {
    fn observe(&mut self, reading: Option<DateTime<Utc>>, max_none_values: u8) {
        if let Some(time) = reading {
            self.value = Some(time);
            self.none_streak = 0;
            return;
        }

        self.none_streak += 1;
        if self.none_streak >= max_none_values {
            self.value = None;
            self.none_streak = 0;
        }
    }

    fn replace(&mut self, reading: Option<DateTime<Utc>>) {
        self.value = reading;
        self.none_streak = 0;
    }
}

/// Smooths the planned and estimated time of one departure slot across polls
///
/// `none_streak` stays in `[0, max_none_values)`: the miss that would reach
/// the threshold clears the planned time and resets the counter to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureStabilizer {
    attr_planned: String,
    attr_estimated: String,
    planned: HeldTime,
    estimated: HeldTime,
    policy: EstimatedTimePolicy,
    max_none_values: u8,
}

impl DepartureStabilizer {
    /// Create a stabilizer publishing under the given attribute names
    #[must_use]
    pub fn new(attr_planned: impl Into<String>, attr_estimated: impl Into<String>) -> Self {
        Self {
            attr_planned: attr_planned.into(),
            attr_estimated: attr_estimated.into(),
            planned: HeldTime::default(),
            estimated: HeldTime::default(),
            policy: EstimatedTimePolicy::default(),
            max_none_values: MAX_NONE_VALUES,
        }
    }

    /// Choose how the estimated time is handled
    #[must_use]
    pub const fn with_policy(mut self, policy: EstimatedTimePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the miss threshold (values below 1 are raised to 1)
    #[must_use]
    pub fn with_max_none_values(mut self, max_none_values: u8) -> Self {
        self.max_none_values = max_none_values.max(1);
        self
    }

    /// Current planned time
    #[must_use]
    pub const fn planned_time(&self) -> Option<DateTime<Utc>> {
        self.planned.value
    }

    /// Current estimated time
    #[must_use]
    pub const fn estimated_time(&self) -> Option<DateTime<Utc>> {
        self.estimated.value
    }

    /// Consecutive readings without a planned time
    #[must_use]
    pub const fn none_streak(&self) -> u8 {
        self.planned.none_streak
    }

    /// Configured miss threshold
    #[must_use]
    pub const fn max_none_values(&self) -> u8 {
        self.max_none_values
    }

    /// Configured estimated-time policy
    #[must_use]
    pub const fn policy(&self) -> EstimatedTimePolicy {
        self.policy
    }

    /// Feed one poll's reading for this slot
    ///
    /// `None` means the line has no departure in this slot any more, which
    /// resets everything immediately.
    pub fn update(&mut self, reading: Option<DepartureReading>) {
        let Some(reading) = reading else {
            self.clear();
            return;
        };

        self.planned
            .observe(reading.planned_time, self.max_none_values);

        match self.policy {
            EstimatedTimePolicy::Passthrough => self.estimated.replace(reading.estimated_time),
            EstimatedTimePolicy::Stabilized => self
                .estimated
                .observe(reading.estimated_time, self.max_none_values),
        }
    }

    /// Reset to the initial state
    pub fn clear(&mut self) {
        self.planned = HeldTime::default();
        self.estimated = HeldTime::default();
    }

    /// Attribute names `(planned, estimated)`
    #[must_use]
    pub fn attribute_keys(&self) -> (&str, &str) {
        (&self.attr_planned, &self.attr_estimated)
    }

    /// Current values keyed by the configured attribute names
    ///
    /// Times are RFC 3339 strings; missing times are `null`.
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(2);
        map.insert(self.attr_planned.clone(), time_value(self.planned.value));
        map.insert(self.attr_estimated.clone(), time_value(self.estimated.value));
        map
    }
}

fn time_value(time: Option<DateTime<Utc>>) -> Value {
    time.map_or(Value::Null, |t| Value::String(t.to_rfc3339()))
}
