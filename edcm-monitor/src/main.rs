//! Elite Dangerous Construction Monitor
//!
//! Follows the game's journal, tracks colonisation construction sites and plans hauling runs.

mod config;
mod report;
mod shutdown;
mod snapshot;
mod state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config::{ConfigLoader, LoadedConfig};
use edcm_core::processors::spawn_pipeline;
use edcm_sdk::MarketId;
use edcm_sdk::objects::{RouteOptimizationRequest, RoutePlanDto};
use report::spawn_reporter;
use shutdown::shutdown_signal;
use snapshot::Snapshot;
use state::AppState;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Construction monitor - journal follower and route planner for colonisation sites
#[derive(Parser, Debug)]
#[command(name = "edcm-monitor")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "EDCM_CONFIG", default_value = "./edcm-config.toml")]
    config: PathBuf,

    /// Override the journal directory
    #[arg(short, long, env = "EDCM_JOURNAL_DIR")]
    journal_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the journal until interrupted (default)
    Watch,
    /// Plan delivery runs for one construction site and print them as JSON
    Plan {
        /// Market id of the construction site
        #[arg(long)]
        site: MarketId,

        /// Tons per run; defaults to the configured capacity
        #[arg(long)]
        capacity: Option<u64>,

        /// Markets a single run may visit
        #[arg(long)]
        max_legs: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let loaded_config = ConfigLoader::new(&args.config, args.journal_dir)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => run_watch(loaded_config).await,
        Command::Plan {
            site,
            capacity,
            max_legs,
        } => run_plan(loaded_config, site, capacity, max_legs).await,
    }
}

async fn run_watch(config: LoadedConfig) -> anyhow::Result<()> {
    tracing::info!("Starting edcm-monitor v{}", env!("CARGO_PKG_VERSION"));
    config.ensure_watches()?;

    let state = AppState::new();
    restore(&state, &config).await?;

    let registry = state.handler_registry();
    tracing::info!(
        event_types = ?registry.event_types(),
        watches = config.monitor.watches.len(),
        "Handlers registered"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pipeline = spawn_pipeline(config.monitor.clone(), registry, shutdown_rx.clone());
    let reporter = config
        .report_interval
        .map(|period| spawn_reporter(state.clone(), pipeline.stats(), period, shutdown_rx));

    if let Err(e) = shutdown_signal().await {
        tracing::error!("Failed to install signal handlers: {}", e);
    }

    // Stop polling, then drain whatever is already queued
    let _ = shutdown_tx.send(true);
    pipeline.join().await;
    if let Some(reporter) = reporter {
        if let Err(e) = reporter.await {
            tracing::error!("Reporter task failed: {}", e);
        }
    }

    Snapshot::capture(&state)
        .await
        .save(&config.snapshot_path)
        .map_err(|e| {
            tracing::error!("Failed to save snapshot: {}", e);
            e
        })?;
    tracing::info!(path = ?config.snapshot_path, "Snapshot saved, shutdown complete");
    Ok(())
}

async fn run_plan(
    config: LoadedConfig,
    site: MarketId,
    capacity: Option<u64>,
    max_legs: Option<u32>,
) -> anyhow::Result<()> {
    let state = AppState::new();
    restore(&state, &config).await?;

    let request = RouteOptimizationRequest {
        construction_site_id: site,
        cargo_capacity_tons: capacity,
        max_markets_per_run: max_legs.unwrap_or(config.route.max_markets_per_run),
    };
    let plan = state
        .route_planner(config.route.default_capacity)
        .plan(&request)
        .await?;

    println!("{}", serde_json::to_string_pretty(&RoutePlanDto::from(&plan))?);
    Ok(())
}

async fn restore(state: &AppState, config: &LoadedConfig) -> anyhow::Result<()> {
    match Snapshot::load(&config.snapshot_path)? {
        Some(snapshot) => snapshot.restore_into(state).await,
        None => tracing::info!(path = ?config.snapshot_path, "No snapshot found, starting empty"),
    }
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so that `plan` output on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
