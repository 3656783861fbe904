use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use horde_siege::{
    headless::HeadlessRunner,
    scenario::{Scenario, ScenarioLoader},
    snapshot::SnapshotWriter,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Zombie-horde supply-drop simulation")]
struct Cli {
    /// Log filter (overridden by RUST_LOG, defaults to the scenario's level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario headless until it is won or the day limit passes
    Run {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/ile_perrot.yaml")]
        scenario: PathBuf,

        /// Override the day limit
        #[arg(long)]
        days: Option<u64>,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for periodic snapshots
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
    /// Serve a live game over HTTP with a server-sent event stream
    Serve {
        #[arg(long, default_value = "scenarios/ile_perrot.yaml")]
        scenario: PathBuf,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Wall-clock milliseconds between engine advances
        #[arg(long, default_value_t = 100)]
        step_ms: u64,
    },
}

fn init_tracing(cli_level: Option<&str>, scenario: &Scenario) {
    let fallback = cli_level.unwrap_or(&scenario.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");

    match cli.command {
        Command::Run {
            scenario,
            days,
            seed,
            snapshot_dir,
        } => {
            let mut scenario = loader.load(&scenario)?;
            init_tracing(cli.log_level.as_deref(), &scenario);
            if let Some(seed) = seed {
                scenario.seed = seed;
            }
            let snapshot_dir = snapshot_dir.unwrap_or_else(|| PathBuf::from("snapshots"));

            let engine = scenario.build_engine()?;
            let mut runner = HeadlessRunner::new(engine, days.unwrap_or(scenario.max_days))
                .with_scripted_drops(&scenario.scripted_drops)
                .with_snapshot_writer(SnapshotWriter::new(
                    snapshot_dir,
                    scenario.snapshot_interval_days,
                ));
            let report = runner.run()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve {
            scenario,
            host,
            port,
            step_ms,
        } => {
            let scenario = loader.load(&scenario)?;
            init_tracing(cli.log_level.as_deref(), &scenario);
            web::run(WebServerConfig {
                scenario,
                host,
                port,
                step: Duration::from_millis(step_ms),
            })
            .await?;
        }
    }
    Ok(())
}
