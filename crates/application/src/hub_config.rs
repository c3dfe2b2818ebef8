//! Persisted hub configuration
//!
//! A hub is one monitored stop together with the lines the user tracks
//! there. The stored document is a flat JSON record:
//!
//! ```json
//! {
//!   "backend": "motis",
//!   "api_url": "https://api.transitous.org/api",
//!   "stop_ids": ["de:09564:704"],
//!   "stop_name": "Plärrer",
//!   "stop_location": { "latitude": 49.4478, "longitude": 11.0629 },
//!   "hub_name": "Plärrer",
//!   "lines": [{ "route_id": "...", "direction_id": "...", "head_sign": "...",
//!               "route_short_name": "...", "transport_mode": "BUS" }]
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use domain::{DomainError, GeoLocation, Line, LineKey};
use serde::{Deserialize, Serialize};

/// Key prefix of hub documents in the config store
pub const HUB_KEY_PREFIX: &str = "hub:";

/// Which API flavour a hub talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Motis (e.g. Transitous)
    #[default]
    Motis,
    /// EFA with rapidJSON output
    Efa,
}

impl Backend {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Motis => "motis",
            Self::Efa => "efa",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "motis" => Ok(Self::Motis),
            "efa" => Ok(Self::Efa),
            other => Err(DomainError::ValidationError(format!(
                "unknown backend '{other}' (expected motis or efa)"
            ))),
        }
    }
}

/// Configuration of one monitored stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    /// API flavour
    #[serde(default)]
    pub backend: Backend,
    /// Base URL of the API
    pub api_url: String,
    /// Stop ids belonging to the hub; the first one is queried
    pub stop_ids: Vec<String>,
    /// Display name of the stop
    pub stop_name: String,
    /// Stop coordinates, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_location: Option<GeoLocation>,
    /// User-chosen hub name, unique per store
    pub hub_name: String,
    /// Tracked lines
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl HubConfig {
    /// Create a hub without lines
    #[must_use]
    pub fn new(
        backend: Backend,
        api_url: impl Into<String>,
        stop_ids: Vec<String>,
        stop_name: impl Into<String>,
        hub_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            api_url: api_url.into(),
            stop_ids,
            stop_name: stop_name.into(),
            stop_location: None,
            hub_name: hub_name.into(),
            lines: Vec::new(),
        }
    }

    /// Set the tracked lines
    #[must_use]
    pub fn with_lines(mut self, lines: Vec<Line>) -> Self {
        self.lines = lines;
        self
    }

    /// Set the stop coordinates
    #[must_use]
    pub const fn with_location(mut self, location: GeoLocation) -> Self {
        self.stop_location = Some(location);
        self
    }

    /// Stop id sent to the backend
    #[must_use]
    pub fn primary_stop_id(&self) -> Option<&str> {
        self.stop_ids.first().map(String::as_str)
    }

    /// Config store key of this hub
    #[must_use]
    pub fn storage_key(&self) -> String {
        hub_key(&self.hub_name)
    }

    /// Tracked line with the given unique id
    #[must_use]
    pub fn line_by_unique_id(&self, unique_id: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.unique_id() == unique_id)
    }

    /// Check that the hub can be polled
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first problem found.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.hub_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "hub name must not be empty".into(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "api url must not be empty".into(),
            ));
        }
        if self.stop_ids.iter().all(|id| id.trim().is_empty()) {
            return Err(DomainError::InvalidStop(
                "at least one stop id is required".into(),
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::ValidationError(
                "at least one line must be selected".into(),
            ));
        }
        for line in &self.lines {
            line.validate()?;
        }
        Ok(())
    }
}

/// Config store key for a hub name
#[must_use]
pub fn hub_key(hub_name: &str) -> String {
    format!("{HUB_KEY_PREFIX}{}", hub_name.trim())
}

/// Lines added and removed by a line update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineChanges {
    /// Newly tracked lines
    pub added: Vec<Line>,
    /// Lines no longer tracked
    pub removed: Vec<Line>,
}

impl LineChanges {
    /// Compare two line selections by [`LineKey`]
    #[must_use]
    pub fn between(current: &[Line], selected: &[Line]) -> Self {
        let contains = |lines: &[Line], key: &LineKey| lines.iter().any(|l| &l.key() == key);

        Self {
            added: selected
                .iter()
                .filter(|l| !contains(current, &l.key()))
                .cloned()
                .collect(),
            removed: current
                .iter()
                .filter(|l| !contains(selected, &l.key()))
                .cloned()
                .collect(),
        }
    }

    /// True when nothing changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
