//! Subcommand handlers

use std::sync::Arc;

use anyhow::{Context, bail};
use application::{
    Backend, ConfigStore, DEPARTURE_SLOTS, DepartureHub, DeparturesPort, HubConfig, SetupService,
};
use domain::{Line, Stop};
use infrastructure::{AppConfig, EFA_ENDPOINTS, departures_port, efa_endpoint};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::output;

/// Backend selection shared by the commands that talk to an API
#[derive(Debug, Clone, clap::Args)]
pub struct BackendArgs {
    /// API flavour
    #[arg(short, long, default_value_t = Backend::Motis)]
    pub backend: Backend,

    /// Base URL of the API
    #[arg(long)]
    pub api_url: Option<String>,

    /// Known EFA instance by name, see `endpoints`
    #[arg(short, long, conflicts_with = "api_url")]
    pub endpoint: Option<String>,
}

/// Shared state of one CLI invocation
pub struct App {
    config: AppConfig,
    store: Arc<dyn ConfigStore>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(config: AppConfig, store: Arc<dyn ConfigStore>) -> Self {
        Self { config, store }
    }

    fn api_url(&self, args: &BackendArgs) -> anyhow::Result<String> {
        match (&args.api_url, &args.endpoint, args.backend) {
            (Some(url), _, _) => Ok(url.clone()),
            (None, Some(name), Backend::Efa) => efa_endpoint(name)
                .map(str::to_string)
                .with_context(|| {
                    format!("unknown EFA endpoint '{name}', known: {}", known_endpoints())
                }),
            (None, Some(_), Backend::Motis) => bail!("--endpoint needs --backend efa"),
            (None, None, Backend::Motis) => Ok(self.config.api.base_url.clone()),
            (None, None, Backend::Efa) => bail!(
                "--api-url or --endpoint is required for the EFA backend, known endpoints: {}",
                known_endpoints()
            ),
        }
    }

    fn port(&self, backend: Backend, api_url: &str) -> anyhow::Result<Arc<dyn DeparturesPort>> {
        let api = self.config.api_for(api_url);
        api.validate().map_err(anyhow::Error::msg)?;
        Ok(departures_port(backend, &api)?)
    }

    fn setup(&self, port: Arc<dyn DeparturesPort>) -> SetupService {
        SetupService::new(port, Arc::clone(&self.store))
            .with_nearby_radius(self.config.polling.poll_settings().radius_m)
    }

    /// Setup service for commands that only touch the hub store
    fn storage(&self) -> anyhow::Result<SetupService> {
        let port = self.port(Backend::Motis, &self.config.api.base_url)?;
        Ok(self.setup(port))
    }

    async fn hub(&self, name: &str) -> anyhow::Result<DepartureHub> {
        let config = self.storage()?.load_hub(name).await?;
        let port = self.port(config.backend, &config.api_url)?;
        Ok(DepartureHub::with_policy(
            config,
            port,
            self.config.polling.poll_settings(),
            self.config.polling.estimated_time_policy,
        ))
    }

    pub async fn stops(&self, query: &str, args: &BackendArgs) -> anyhow::Result<()> {
        let port = self.port(args.backend, &self.api_url(args)?)?;
        for stop in self.setup(port).search_stops(query).await? {
            println!("{}", output::stop_line(&stop));
        }
        Ok(())
    }

    pub async fn lines(&self, stop_id: &str, args: &BackendArgs) -> anyhow::Result<()> {
        let port = self.port(args.backend, &self.api_url(args)?)?;
        let lines = self.setup(port).discover_lines(stop_id).await?;
        if lines.is_empty() {
            println!("No lines found at {stop_id}");
        }
        for line in &lines {
            println!("{}", output::line_line(line));
        }
        Ok(())
    }

    pub async fn create(&self, request: SetupRequest) -> anyhow::Result<()> {
        let api_url = self.api_url(&request.backend)?;
        let service = self.setup(self.port(request.backend.backend, &api_url)?);

        let stops = service.search_stops(&request.stop).await?;
        let stop = choose_stop(stops, request.stop_id.as_deref())?;
        info!(stop = %stop.id, "Using stop");

        let available = service.discover_lines(&stop.id).await?;
        let lines = choose_lines(&available, &request.lines, request.all_lines)?;

        let mut config = HubConfig::new(
            request.backend.backend,
            api_url,
            vec![stop.id.clone()],
            stop.name.clone(),
            request.name.unwrap_or_else(|| stop.name.clone()),
        )
        .with_lines(lines);
        if let Some(location) = stop.location {
            config = config.with_location(location);
        }

        let config = service.create_hub(config).await?;
        println!("Created hub:\n{}", output::hub_block(&config));
        Ok(())
    }

    pub async fn hubs(&self) -> anyhow::Result<()> {
        let hubs = self.storage()?.list_hubs().await?;
        if hubs.is_empty() {
            println!("No hubs configured. Create one with `departures setup`.");
        }
        for hub in &hubs {
            print!("{}", output::hub_block(hub));
        }
        Ok(())
    }

    pub async fn options(&self, hub_name: &str, selected: &[String]) -> anyhow::Result<()> {
        let current = self.storage()?.load_hub(hub_name).await?;
        let service = self.setup(self.port(current.backend, &current.api_url)?);
        let stop_id = current
            .primary_stop_id()
            .context("hub has no stop id")?
            .to_string();

        let available = service.discover_lines(&stop_id).await?;
        if selected.is_empty() {
            println!("Available lines at {}:", current.stop_name);
            for line in &available {
                let marker = if current.lines.contains(line) { "*" } else { " " };
                println!("{marker} {}", output::line_line(line));
            }
            return Ok(());
        }

        let (_, changes) = service.update_lines(hub_name, selected, &available).await?;
        for line in &changes.added {
            println!("+ {}", line.label());
        }
        for line in &changes.removed {
            println!("- {}", line.label());
        }
        Ok(())
    }

    pub async fn remove(&self, hub_name: &str) -> anyhow::Result<()> {
        self.storage()?.remove_hub(hub_name).await?;
        println!("Removed hub {hub_name}");
        Ok(())
    }

    pub async fn poll(&self, hub_name: &str, json: bool) -> anyhow::Result<()> {
        let mut hub = self.hub(hub_name).await?;
        hub.refresh().await?;
        print_states(&hub, json)
    }

    pub async fn watch(
        &self,
        hub_name: &str,
        interval_secs: Option<u64>,
        json: bool,
    ) -> anyhow::Result<()> {
        let mut hub = self.hub(hub_name).await?;
        let period = interval_secs
            .map_or_else(|| self.config.polling.update_interval(), std::time::Duration::from_secs);
        if period.is_zero() {
            bail!("interval must be at least one second");
        }

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(hub = hub_name, ?period, "Watching departures");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.reload_lines(&mut hub).await;
                    match hub.refresh().await {
                        Ok(()) => print_states(&hub, json)?,
                        Err(e) => warn!(error = %e, "Poll failed, keeping previous state"),
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for ctrl-c")?;
                    info!("Stopping");
                    return Ok(());
                }
            }
        }
    }

    /// Pick up line changes made with `options` while watching
    async fn reload_lines(&self, hub: &mut DepartureHub) {
        let stored = match self.storage() {
            Ok(service) => service.load_hub(hub.name()).await.map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };
        match stored {
            Ok(config) => {
                let changes = hub.sync_lines(&config.lines);
                if !changes.is_empty() {
                    info!(
                        added = changes.added.len(),
                        removed = changes.removed.len(),
                        "Tracked lines changed"
                    );
                }
            },
            Err(e) => warn!(error = %e, "Could not reload hub, keeping current lines"),
        }
    }

    pub fn endpoints() {
        for (name, url) in EFA_ENDPOINTS {
            println!("{name:<20} {url}");
        }
    }

    pub fn show_config(&self) -> anyhow::Result<()> {
        print!("{}", self.config.to_toml()?);
        Ok(())
    }
}

/// Arguments of `setup`
#[derive(Debug)]
pub struct SetupRequest {
    pub stop: String,
    pub stop_id: Option<String>,
    pub name: Option<String>,
    pub lines: Vec<String>,
    pub all_lines: bool,
    pub backend: BackendArgs,
}

fn print_states(hub: &DepartureHub, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(&hub.states())?);
        return Ok(());
    }
    for state in hub.states() {
        println!("{}", output::sensor_line(&state, DEPARTURE_SLOTS));
    }
    Ok(())
}

fn known_endpoints() -> String {
    EFA_ENDPOINTS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The stop with `stop_id`, or the best match
fn choose_stop(stops: Vec<Stop>, stop_id: Option<&str>) -> anyhow::Result<Stop> {
    match stop_id {
        Some(id) => stops
            .into_iter()
            .find(|s| s.id == id)
            .with_context(|| format!("stop {id} is not among the search results")),
        None => stops.into_iter().next().context("no stop found"),
    }
}

/// Lines picked by unique id, or all of them
fn choose_lines(available: &[Line], selected: &[String], all: bool) -> anyhow::Result<Vec<Line>> {
    if all {
        return Ok(available.to_vec());
    }
    if selected.is_empty() {
        let listing: Vec<String> = available.iter().map(output::line_line).collect();
        bail!(
            "select lines with --line <ID> or --all-lines; available:\n{}",
            listing.join("\n")
        );
    }

    let mut lines = Vec::with_capacity(selected.len());
    for id in selected {
        let line = available
            .iter()
            .find(|l| &l.unique_id() == id)
            .with_context(|| format!("line {id} does not serve this stop"))?;
        lines.push(line.clone());
    }
    Ok(lines)
}
