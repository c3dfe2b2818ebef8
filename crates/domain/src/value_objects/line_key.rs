//! Line identity value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlates a stream of departures to one tracked line: `(route_id, direction_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    /// Route (line) identifier
    pub route_id: String,
    /// Direction identifier; for EFA backends this is the destination id
    pub direction_id: String,
}

impl LineKey {
    /// Create a new line key
    #[must_use]
    pub fn new(route_id: impl Into<String>, direction_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            direction_id: direction_id.into(),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.route_id, self.direction_id)
    }
}
