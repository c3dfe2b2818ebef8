//! A configured stop with its line sensors

use std::sync::Arc;

use domain::{EstimatedTimePolicy, Line};
use tracing::{info, instrument};

use super::coordinator::{DeparturesCoordinator, PollSettings};
use super::line_sensor::{LineSensor, SensorState};
use crate::error::ApplicationError;
use crate::hub_config::{HubConfig, LineChanges};
use crate::ports::DeparturesPort;

/// Coordinator plus one sensor per tracked line
#[derive(Debug)]
pub struct DepartureHub {
    config: HubConfig,
    policy: EstimatedTimePolicy,
    coordinator: DeparturesCoordinator,
    sensors: Vec<LineSensor>,
}

impl DepartureHub {
    /// Build a hub from its stored configuration
    #[must_use]
    pub fn new(config: HubConfig, port: Arc<dyn DeparturesPort>, settings: PollSettings) -> Self {
        Self::with_policy(config, port, settings, EstimatedTimePolicy::default())
    }

    /// Build a hub whose sensors use the given estimated-time policy
    #[must_use]
    pub fn with_policy(
        config: HubConfig,
        port: Arc<dyn DeparturesPort>,
        settings: PollSettings,
        policy: EstimatedTimePolicy,
    ) -> Self {
        let coordinator =
            DeparturesCoordinator::new(port, config.stop_ids.clone(), config.lines.len(), settings);
        let sensors = config
            .lines
            .iter()
            .map(|line| LineSensor::with_policy(&config.stop_name, line.clone(), policy))
            .collect();

        Self {
            config,
            policy,
            coordinator,
            sensors,
        }
    }

    /// Hub configuration
    #[must_use]
    pub const fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Hub name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.hub_name
    }

    /// Underlying coordinator
    #[must_use]
    pub const fn coordinator(&self) -> &DeparturesCoordinator {
        &self.coordinator
    }

    /// Line sensors
    #[must_use]
    pub fn sensors(&self) -> &[LineSensor] {
        &self.sensors
    }

    /// Poll once and update every sensor
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::UpdateFailed` when the poll fails; sensors
    /// keep their previous state in that case.
    #[instrument(skip(self), fields(hub = %self.config.hub_name))]
    pub async fn refresh(&mut self) -> Result<(), ApplicationError> {
        let departures = self.coordinator.refresh().await?;
        for sensor in &mut self.sensors {
            sensor.handle_update(departures);
        }
        Ok(())
    }

    /// Snapshots of all sensors
    #[must_use]
    pub fn states(&self) -> Vec<SensorState> {
        self.sensors.iter().map(LineSensor::state).collect()
    }

    /// Track exactly `lines`, e.g. after the stored hub was edited
    ///
    /// Sensors of lines that stay keep their state.
    pub fn sync_lines(&mut self, lines: &[Line]) -> LineChanges {
        let changes = LineChanges::between(&self.config.lines, lines);
        if !changes.is_empty() {
            self.apply_changes(&changes);
        }
        changes
    }

    /// Add and remove sensors after a line update
    pub fn apply_changes(&mut self, changes: &LineChanges) {
        self.sensors
            .retain(|s| !changes.removed.iter().any(|l| l == s.line()));
        self.config
            .lines
            .retain(|l| !changes.removed.contains(l));

        for line in &changes.added {
            if self.config.lines.contains(line) {
                continue;
            }
            self.config.lines.push(line.clone());
            self.sensors.push(LineSensor::with_policy(
                &self.config.stop_name,
                line.clone(),
                self.policy,
            ));
        }

        self.coordinator.set_line_count(self.config.lines.len());
        info!(
            hub = %self.config.hub_name,
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Hub lines changed"
        );
    }
}
