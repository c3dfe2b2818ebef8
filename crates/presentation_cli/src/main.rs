//! Departures CLI
//!
//! Finds stops and lines, manages hubs, and polls departures.

#![allow(clippy::print_stdout)]

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{App, BackendArgs, SetupRequest};
use infrastructure::{AppConfig, init_logging, open_config_store};

/// Public transport departures monitor
#[derive(Parser)]
#[command(name = "departures")]
#[command(author, version, about = "Public transport departures monitor", long_about = None)]
struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./departures.toml when present)
    #[arg(short, long, global = true, env = "DEPARTURES_CONFIG")]
    config: Option<PathBuf>,

    /// Hub database, overrides `database.path`
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search stops by name
    Stops {
        /// Search text
        query: String,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// List the lines serving a stop
    Lines {
        /// Stop id as printed by `stops`
        stop_id: String,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Create a hub for a stop and a set of lines
    ///
    /// Example: departures setup "Plärrer" --name Home --line 'vgn:U1-SUBWAY-1'
    Setup {
        /// Stop search text
        stop: String,

        /// Pick this stop id from the search results (default: first result)
        #[arg(long)]
        stop_id: Option<String>,

        /// Hub name (default: the stop name)
        #[arg(short, long)]
        name: Option<String>,

        /// Line unique id to track, repeatable
        #[arg(short, long = "line")]
        lines: Vec<String>,

        /// Track every line serving the stop
        #[arg(long, conflicts_with = "lines")]
        all_lines: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// List configured hubs
    Hubs,

    /// Show or change the tracked lines of a hub
    ///
    /// Without --line, lists the lines at the stop with tracked ones marked.
    /// With --line, the given set replaces the tracked lines.
    Options {
        /// Hub name
        hub: String,

        /// Line unique id to track, repeatable
        #[arg(short, long = "line")]
        lines: Vec<String>,
    },

    /// Delete a hub
    Remove {
        /// Hub name
        hub: String,
    },

    /// Poll a hub once and print its sensors
    Poll {
        /// Hub name
        hub: String,

        /// Print sensor states as JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll a hub periodically until interrupted
    Watch {
        /// Hub name
        hub: String,

        /// Seconds between polls (default: polling.update_interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Print sensor states as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List the known EFA endpoints
    Endpoints,

    /// Print the effective configuration as TOML
    Config,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Load the configuration and apply command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.verbose > 0 {
        config.logging = config
            .logging
            .with_filter(log_filter_from_verbosity(cli.verbose));
    }
    if let Some(db) = &cli.db {
        config.database.path.clone_from(db);
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Config => {
            return App::new(config, std::sync::Arc::new(infrastructure::InMemoryConfigStore::new()))
                .show_config();
        },
        Commands::Endpoints => {
            App::endpoints();
            return Ok(());
        },
        _ => {},
    }

    let store = open_config_store(&config.database)?;
    let app = App::new(config, store);

    match cli.command {
        Commands::Stops { query, backend } => app.stops(&query, &backend).await,
        Commands::Lines { stop_id, backend } => app.lines(&stop_id, &backend).await,
        Commands::Setup {
            stop,
            stop_id,
            name,
            lines,
            all_lines,
            backend,
        } => {
            app.create(SetupRequest {
                stop,
                stop_id,
                name,
                lines,
                all_lines,
                backend,
            })
            .await
        },
        Commands::Hubs => app.hubs().await,
        Commands::Options { hub, lines } => app.options(&hub, &lines).await,
        Commands::Remove { hub } => app.remove(&hub).await,
        Commands::Poll { hub, json } => app.poll(&hub, json).await,
        Commands::Watch {
            hub,
            interval,
            json,
        } => app.watch(&hub, interval, json).await,
        Commands::Config => app.show_config(),
        Commands::Endpoints => {
            App::endpoints();
            Ok(())
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_filter_verbosity() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn parses_setup() {
        let cli = Cli::try_parse_from([
            "departures",
            "-vv",
            "setup",
            "Plärrer",
            "--name",
            "Home",
            "--line",
            "a",
            "--line",
            "b",
            "--backend",
            "efa",
            "--api-url",
            "https://efa.example.org/efa",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Setup {
            stop,
            name,
            lines,
            backend,
            all_lines,
            ..
        } = cli.command
        else {
            unreachable!("expected setup")
        };
        assert_eq!(stop, "Plärrer");
        assert_eq!(name.as_deref(), Some("Home"));
        assert_eq!(lines, vec!["a", "b"]);
        assert!(!all_lines);
        assert_eq!(backend.backend, application::Backend::Efa);
    }

    #[test]
    fn lines_and_all_lines_conflict() {
        let result = Cli::try_parse_from([
            "departures",
            "setup",
            "Plärrer",
            "--line",
            "a",
            "--all-lines",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["departures", "poll", "Home", "--db", ":memory:", "-v"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some(":memory:"));
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn endpoint_and_api_url_conflict() {
        let result = Cli::try_parse_from([
            "departures",
            "stops",
            "Plärrer",
            "--backend",
            "efa",
            "--endpoint",
            "vgn",
            "--api-url",
            "https://efa.example.org/efa",
        ]);
        assert!(result.is_err());

        let cli =
            Cli::try_parse_from(["departures", "lines", "s1", "-b", "efa", "-e", "vgn"]).unwrap();
        let Commands::Lines { backend, .. } = cli.command else {
            unreachable!("expected lines")
        };
        assert_eq!(backend.endpoint.as_deref(), Some("vgn"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["departures", "stops", "x", "--backend", "hafas"]).is_err());
    }
}
