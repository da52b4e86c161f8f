//! # ITR Stats Gatherer - Main Entry Point
//!
//! This tool tracks the Income Tax e-portal's public statistics by:
//!
//! 1. Fetching the statistics payload with browser-like headers and retries
//! 2. Persisting each successful retrieval as an immutable SQLite snapshot
//! 3. Skipping runs while the newest snapshot is fresher than the cadence
//! 4. Reconstructing a deduplicated daily series as a terminal table
//! 5. Optionally exporting the series as JSON

use std::{
    path::PathBuf,
    time::Duration,
};

use clap::{
    Parser,
    Subcommand,
};
use color_eyre::Result;
use itr_stats_gatherer::{
    config::{
        Config,
        DEFAULT_DB_PATH,
        DEFAULT_ENDPOINT,
    },
    report,
    CollectOutcome,
    Orchestrator,
    SnapshotStore,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "itr-stats-gatherer")]
#[command(about = "Income Tax e-portal statistics gatherer")]
#[command(version)]
struct Cli {
    /// SQLite database file holding collected snapshots
    #[arg(long, env = "ITR_DB_PATH", default_value = DEFAULT_DB_PATH, global = true)]
    db_path: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the current statistics and store a snapshot if one is due
    Collect {
        /// Statistics endpoint URL
        #[arg(long, env = "ITR_ENDPOINT_URL", default_value = DEFAULT_ENDPOINT)]
        endpoint_url: String,

        /// Minimum age of the newest snapshot before collecting again (e.g. "4h")
        #[arg(long, default_value = "4h")]
        min_age: String,

        /// HTTP request timeout (e.g. "20s")
        #[arg(long, default_value = "20s")]
        timeout: String,

        /// Upper bound of a random startup delay, to desynchronize scheduled
        /// runs that all wake at the same moment (e.g. "30s")
        #[arg(long, default_value = "0s")]
        startup_jitter: String,

        /// Collect even if the newest snapshot is recent
        #[arg(long)]
        force: bool,
    },

    /// Render the deduplicated daily series from stored snapshots
    Report {
        /// Output file path (optional, exports the series as JSON)
        #[arg(long)]
        output_file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("itr_stats_gatherer={log_level}"))
        .init();

    color_eyre::install()?;

    match cli.command {
        Command::Collect {
            endpoint_url,
            min_age,
            timeout,
            startup_jitter,
            force,
        } => {
            info!("Starting collection run");
            info!("Endpoint URL: {}", endpoint_url);
            info!("Database: {}", cli.db_path.display());

            let min_age = parse_duration(&min_age)?;
            let timeout = parse_duration(&timeout)?;
            let startup_jitter = parse_duration(&startup_jitter)?;

            let config = Config::new(&endpoint_url, cli.db_path, min_age, timeout, force)?;

            sleep_startup_jitter(startup_jitter).await;

            let orchestrator = Orchestrator::new(config)?;
            match orchestrator.collect_once().await? {
                CollectOutcome::Skipped { reason } => {
                    info!(%reason, "nothing collected");
                }
                CollectOutcome::Collected(snapshot) => {
                    info!(
                        id = snapshot.id,
                        collected_at = %snapshot.collected_at,
                        "collection completed successfully"
                    );
                }
            }
        }

        Command::Report { output_file } => {
            let store = SnapshotStore::open(&cli.db_path)?;
            store.init()?;
            let snapshots = store.read_all()?;
            let series = report::latest_per_provider_date(snapshots);

            println!("{}", report::format(&series));

            if let Some(output_file) = &output_file {
                let json_string = serde_json::to_string_pretty(&report::summary(&series))?;
                tokio::fs::write(output_file, json_string).await?;
                info!("Series exported successfully to {}", output_file);
            }
        }
    }

    Ok(())
}

fn parse_duration(duration_str: &str) -> Result<Duration> {
    humantime::parse_duration(duration_str)
        .map_err(|e| eyre::eyre!("Invalid duration '{}': {}", duration_str, e))
}

/// Sleep a uniform random delay up to `cap`, so a fleet of machines waking
/// from sleep at the same minute does not hit the upstream in lockstep.
async fn sleep_startup_jitter(cap: Duration) {
    if cap.is_zero() {
        return;
    }
    let delay = {
        use rand::Rng;
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(0..=cap.as_millis() as u64))
    };
    info!(delay_ms = delay.as_millis() as u64, "startup jitter");
    tokio::time::sleep(delay).await;
}
