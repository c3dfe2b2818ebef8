//! Transit line entity

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::entities::Departure;
use crate::errors::DomainError;
use crate::line_id::{compare_line_ids, replace_year_token};
use crate::value_objects::{LineKey, TransportMode};

/// A directional transit service the user can track
///
/// Two lines are equal when their [`LineKey`] is equal; display fields
/// (head sign, short name, mode) do not take part in identity.
///
/// Serializes to the flat record persisted with a hub's configuration:
/// `{route_id, direction_id, head_sign, route_short_name, transport_mode}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    /// Route identifier (EFA: the line id, e.g. `van:02067: :R:j25`)
    pub route_id: String,
    /// Direction identifier (EFA: the destination stop id)
    pub direction_id: String,
    /// Destination shown on the vehicle
    pub head_sign: String,
    /// Short public line name, e.g. `U1` or `67`
    pub route_short_name: String,
    /// Transport mode
    #[serde(rename = "transport_mode")]
    pub mode: TransportMode,
}

impl Line {
    /// Create a new line
    #[must_use]
    pub fn new(
        route_id: impl Into<String>,
        direction_id: impl Into<String>,
        head_sign: impl Into<String>,
        route_short_name: impl Into<String>,
        mode: TransportMode,
    ) -> Self {
        Self {
            route_id: route_id.into(),
            direction_id: direction_id.into(),
            head_sign: head_sign.into(),
            route_short_name: route_short_name.into(),
            mode,
        }
    }

    /// Derive the line a departure belongs to
    #[must_use]
    pub fn from_departure(departure: &Departure) -> Self {
        Self {
            route_id: departure.route_id.clone(),
            direction_id: departure.direction_id.clone(),
            head_sign: departure.head_sign.clone(),
            route_short_name: departure.route_short_name.clone(),
            mode: departure.mode,
        }
    }

    /// Identity of this line
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(&self.route_id, &self.direction_id)
    }

    /// Identifier that survives the yearly rollover of EFA line ids
    ///
    /// The service-year token is replaced by a placeholder, so `…:j24` and
    /// `…:j25` of the same route produce the same id.
    #[must_use]
    pub fn unique_id(&self) -> String {
        format!(
            "{}-{}-{}",
            replace_year_token(&self.route_id, true),
            self.mode,
            self.direction_id
        )
    }

    /// Selection label, e.g. `U1 - Fürth Hardhöhe`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.route_short_name, self.head_sign)
    }

    /// Whether a departure belongs to this line
    ///
    /// With `match_year == false` the route ids are compared without their
    /// service-year token.
    #[must_use]
    pub fn matches(&self, departure: &Departure, match_year: bool) -> bool {
        departure.direction_id == self.direction_id
            && compare_line_ids(&departure.route_id, &self.route_id, match_year)
    }

    /// Check that the identifying fields are present
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLine` when `route_id` is empty.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.route_id.trim().is_empty() {
            return Err(DomainError::InvalidLine("route_id must not be empty".into()));
        }
        Ok(())
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.route_id == other.route_id && self.direction_id == other.direction_id
    }
}

impl Eq for Line {}

impl Hash for Line {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.route_id.hash(state);
        self.direction_id.hash(state);
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
