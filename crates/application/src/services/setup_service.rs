//! Hub setup and line selection
//!
//! Walks a user from a stop search to a persisted hub, and later applies
//! changes to the tracked lines.

use std::sync::Arc;

use domain::{DomainError, Line, Stop, dedupe_by_key, unique_lines};
use tracing::{debug, info, instrument, warn};

use super::coordinator::DEFAULT_STOP_RADIUS_M;
use crate::error::ApplicationError;
use crate::hub_config::{HUB_KEY_PREFIX, HubConfig, LineChanges, hub_key};
use crate::ports::{ConfigStore, DeparturesPort};

/// Stop search, line discovery and hub persistence
pub struct SetupService {
    port: Arc<dyn DeparturesPort>,
    store: Arc<dyn ConfigStore>,
    nearby_radius_m: Option<u32>,
}

impl std::fmt::Debug for SetupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupService")
            .field("nearby_radius_m", &self.nearby_radius_m)
            .finish_non_exhaustive()
    }
}

impl SetupService {
    /// Create a new setup service
    #[must_use]
    pub fn new(port: Arc<dyn DeparturesPort>, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            port,
            store,
            nearby_radius_m: Some(DEFAULT_STOP_RADIUS_M),
        }
    }

    /// Radius for collecting the other platforms of a new hub's stop;
    /// `None` keeps only the chosen stop id
    #[must_use]
    pub const fn with_nearby_radius(mut self, radius_m: Option<u32>) -> Self {
        self.nearby_radius_m = radius_m;
        self
    }

    /// Stops matching `query`
    ///
    /// # Errors
    ///
    /// `NoStopFound` when the query is blank or the backend finds nothing.
    #[instrument(skip(self))]
    pub async fn search_stops(&self, query: &str) -> Result<Vec<Stop>, ApplicationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApplicationError::NoStopFound(String::new()));
        }

        let stops = self.port.search_stops(query).await?;
        if stops.is_empty() {
            return Err(ApplicationError::NoStopFound(query.to_string()));
        }
        debug!(count = stops.len(), "Stops found");
        Ok(stops)
    }

    /// Lines serving `stop_id`, each direction once
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    #[instrument(skip(self))]
    pub async fn discover_lines(&self, stop_id: &str) -> Result<Vec<Line>, ApplicationError> {
        let lines = unique_lines(self.port.lines_at_stop(stop_id).await?);
        debug!(count = lines.len(), "Lines discovered");
        Ok(lines)
    }

    /// Validate and persist a new hub
    ///
    /// When the hub has a location, same-named stops around it (platforms of
    /// the same station) are added to its stop ids.
    ///
    /// # Errors
    ///
    /// Validation errors, `AlreadyConfigured` for a taken hub name, and
    /// storage errors.
    #[instrument(skip(self, config), fields(hub = %config.hub_name))]
    pub async fn create_hub(&self, mut config: HubConfig) -> Result<HubConfig, ApplicationError> {
        config.hub_name = config.hub_name.trim().to_string();
        config.lines = unique_lines(config.lines);
        config.validate()?;

        let key = config.storage_key();
        if self.store.get(&key).await?.is_some() {
            return Err(ApplicationError::AlreadyConfigured(config.hub_name));
        }

        self.add_nearby_stops(&mut config).await;
        self.save(&config).await?;
        info!(
            lines = config.lines.len(),
            stops = config.stop_ids.len(),
            "Hub created"
        );
        Ok(config)
    }

    /// Replace the tracked lines of a hub with the selected ones
    ///
    /// `selected` holds [`Line::unique_id`]s chosen from `available` and the
    /// hub's current lines. A discovered line replaces a stored one with the
    /// same unique id, so a service-year rollover swaps `j24` for `j25`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown hub, `NoChanges` when the selection equals
    /// the current lines, validation errors when nothing would be tracked.
    #[instrument(skip(self, selected, available))]
    pub async fn update_lines(
        &self,
        hub_name: &str,
        selected: &[String],
        available: &[Line],
    ) -> Result<(HubConfig, LineChanges), ApplicationError> {
        let mut config = self.load_hub(hub_name).await?;

        let candidates = dedupe_by_key(
            available.iter().chain(&config.lines).cloned(),
            Line::unique_id,
        );
        let chosen: Vec<Line> = candidates
            .into_iter()
            .filter(|l| selected.contains(&l.unique_id()))
            .collect();

        let changes = LineChanges::between(&config.lines, &chosen);
        if changes.is_empty() {
            return Err(ApplicationError::NoChanges);
        }

        config.lines = chosen;
        config.validate()?;
        self.save(&config).await?;

        info!(
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Hub lines updated"
        );
        Ok((config, changes))
    }

    /// Load a stored hub
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown hub, `Storage` for an unreadable document.
    pub async fn load_hub(&self, hub_name: &str) -> Result<HubConfig, ApplicationError> {
        let value = self
            .store
            .get(&hub_key(hub_name))
            .await?
            .ok_or_else(|| DomainError::not_found("Hub", hub_name.trim()))?;

        serde_json::from_value(value)
            .map_err(|e| ApplicationError::Storage(format!("hub '{hub_name}': {e}")))
    }

    /// All stored hubs, sorted by name
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub async fn list_hubs(&self) -> Result<Vec<HubConfig>, ApplicationError> {
        let keys = self.store.keys(HUB_KEY_PREFIX).await?;
        let mut hubs = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(name) = key.strip_prefix(HUB_KEY_PREFIX) else {
                continue;
            };
            hubs.push(self.load_hub(name).await?);
        }
        Ok(hubs)
    }

    /// Delete a stored hub
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown hub.
    #[instrument(skip(self))]
    pub async fn remove_hub(&self, hub_name: &str) -> Result<(), ApplicationError> {
        if !self.store.delete(&hub_key(hub_name)).await? {
            return Err(DomainError::not_found("Hub", hub_name.trim()).into());
        }
        info!("Hub removed");
        Ok(())
    }

    async fn add_nearby_stops(&self, config: &mut HubConfig) {
        let (Some(location), Some(radius_m)) = (config.stop_location, self.nearby_radius_m) else {
            return;
        };

        let stops = match self.port.stops_near(&location, radius_m).await {
            Ok(stops) => stops,
            Err(e) => {
                warn!(error = %e, "Nearby stop lookup failed, keeping the chosen stop only");
                return;
            },
        };

        let name = config.stop_name.trim().to_lowercase();
        for stop in stops {
            if stop.name.trim().to_lowercase() == name && !config.stop_ids.contains(&stop.id) {
                debug!(stop_id = %stop.id, "Adding nearby platform");
                config.stop_ids.push(stop.id);
            }
        }
    }

    async fn save(&self, config: &HubConfig) -> Result<(), ApplicationError> {
        let value = serde_json::to_value(config)
            .map_err(|e| ApplicationError::Internal(format!("serialize hub: {e}")))?;
        self.store.put(&config.storage_key(), &value).await
    }
}
