//! nearby CLI - find places around a position
//!
//! This binary drives the search pipeline from the command line.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use nearby::{
    format_results, format_status, is_settled, resolve_coordinates, start_coordinator,
    start_provider, Config,
};
use nearby_core::{LocationState, SearchPhase};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "nearby")]
#[command(about = "Find places near a location")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct Origin {
    /// Latitude to search around
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude to search around
    #[arg(long, allow_negative_numbers = true)]
    lng: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search once and print the results
    Search {
        /// What to look for, e.g. "atm"
        query: String,

        #[command(flatten)]
        origin: Origin,
    },
    /// Read queries from stdin, one per line, and print state changes
    Interactive {
        #[command(flatten)]
        origin: Origin,
    },
    /// Resolve the location and print its name
    Locate {
        #[command(flatten)]
        origin: Origin,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    match cli.command {
        Some(Commands::Search { query, origin }) => {
            search(cli.config.as_deref(), &query, origin).await
        }
        Some(Commands::Interactive { origin }) => interactive(cli.config.as_deref(), origin).await,
        Some(Commands::Locate { origin }) => locate(cli.config.as_deref(), origin).await,
        None => {
            println!("Run 'nearby search <QUERY> --lat <LAT> --lng <LNG>', or --help for more options");
            Ok(())
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "nearby={level},nearby_core={level},nearby_location={level},nearby_places={level},nearby_coordinator={level}"
        ))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    debug!("Loaded configuration: {config:?}");
    Ok(config)
}

async fn search(config_path: Option<&Path>, query: &str, origin: Origin) -> Result<()> {
    let config = load_config(config_path)?;
    let position = resolve_coordinates(&config, origin.lat, origin.lng)?;
    if query.trim().chars().count() < config.search.min_query_length {
        return Err(anyhow!(
            "Query must be at least {} characters",
            config.search.min_query_length
        ));
    }

    let provider = start_provider(&config, position).await?;
    let coordinator = start_coordinator(&config, &provider)?;

    // One-shot: skip the debounce
    coordinator.set_query(query);
    coordinator.retry();

    let limit = Duration::from_secs(config.places.timeout_secs + 5);
    let mut rx = coordinator.watch();
    let state = tokio::time::timeout(limit, rx.wait_for(is_settled))
        .await
        .map_err(|_| anyhow!("Search did not finish within {}s", limit.as_secs()))?
        .map_err(|_| anyhow!("Search coordinator stopped unexpectedly"))?
        .clone();

    coordinator.shutdown().await;

    println!("{}", format_results(&state));
    if state.phase != SearchPhase::Completed {
        return Err(anyhow!("{}", format_status(&state)));
    }
    Ok(())
}

async fn interactive(config_path: Option<&Path>, origin: Origin) -> Result<()> {
    let config = load_config(config_path)?;
    let position = resolve_coordinates(&config, origin.lat, origin.lng)?;

    let provider = start_provider(&config, position).await?;
    let coordinator = start_coordinator(&config, &provider)?;

    println!("Searching near {position}. Type a query per line, ':retry' to retry, Ctrl-D to quit.");

    let mut states = coordinator.watch();
    let printer = tokio::spawn(async move {
        let mut last_status = String::new();
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if is_settled(&state) {
                println!("{}", format_results(&state));
                last_status.clear();
                continue;
            }
            let status = format_status(&state);
            if !status.is_empty() && status != last_status {
                println!("{status}");
                last_status = status;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.trim() {
            ":retry" => coordinator.retry(),
            ":location" => println!("{}", describe_location(&coordinator.location())),
            _ => coordinator.set_query(line.clone()),
        }
    }

    info!("End of input; shutting down");
    coordinator.shutdown().await;
    if let Err(e) = printer.await {
        warn!("Output task failed: {e}");
    }
    Ok(())
}

async fn locate(config_path: Option<&Path>, origin: Origin) -> Result<()> {
    let config = load_config(config_path)?;
    let position = resolve_coordinates(&config, origin.lat, origin.lng)?;
    let provider = start_provider(&config, position).await?;

    let mut rx = provider.location_state().watch();
    let limit = Duration::from_secs(config.geocoder.timeout_secs + 1);

    // Wait for the reverse lookup to replace the coordinate label, or give up
    // and print the coordinates
    let named = tokio::time::timeout(
        limit,
        rx.wait_for(|s| match s {
            LocationState::Resolved {
                position,
                display_name,
            } => *display_name != position.coordinate_label(),
            _ => false,
        }),
    )
    .await
    .is_ok();
    if !named {
        debug!("Reverse lookup did not finish within {}s", limit.as_secs());
    }

    println!("{}", describe_location(&provider.state()));
    Ok(())
}

fn describe_location(state: &LocationState) -> String {
    match state {
        LocationState::Resolved {
            position,
            display_name,
        } => format!("{display_name} {position}"),
        LocationState::Resolving => "Locating...".to_string(),
        LocationState::PermissionDenied => "Location access is off.".to_string(),
        LocationState::Unknown => "Location unknown.".to_string(),
    }
}
