//! Polling schedule and request sizing.

use std::time::Duration;

use application::{DEFAULT_STOP_RADIUS_M, DEFAULT_TIMES_PER_LINE, PollSettings};
use domain::EstimatedTimePolicy;
use serde::{Deserialize, Serialize};

/// How often and how much to poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between two polls in `watch` mode
    #[serde(default = "default_interval_secs")]
    pub update_interval_secs: u64,

    /// Departures requested per tracked line
    #[serde(default = "default_times_per_line")]
    pub times_per_line: u32,

    /// Radius around the stop in meters (0 disables the radius parameter)
    #[serde(default = "default_radius_m")]
    pub stop_radius_m: u32,

    /// Whether estimated times bridge gaps like planned times do
    #[serde(default)]
    pub estimated_time_policy: EstimatedTimePolicy,
}

const fn default_interval_secs() -> u64 {
    60
}

const fn default_times_per_line() -> u32 {
    DEFAULT_TIMES_PER_LINE
}

const fn default_radius_m() -> u32 {
    DEFAULT_STOP_RADIUS_M
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_interval_secs(),
            times_per_line: default_times_per_line(),
            stop_radius_m: default_radius_m(),
            estimated_time_policy: EstimatedTimePolicy::default(),
        }
    }
}

impl PollingConfig {
    /// Interval between polls
    #[must_use]
    pub const fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Request sizing for the coordinator
    #[must_use]
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            times_per_line: self.times_per_line,
            radius_m: (self.stop_radius_m > 0).then_some(self.stop_radius_m),
        }
    }

    /// Check the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.update_interval_secs == 0 {
            return Err("polling.update_interval_secs must be at least 1".into());
        }
        if self.times_per_line == 0 {
            return Err("polling.times_per_line must be at least 1".into());
        }
        Ok(())
    }
}
