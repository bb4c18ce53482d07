//! tlog-logger - per-minute history logger.
//!
//! Run with: `cargo run -p tlog-logger`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tlog_logger::{AppState, Collector, Config, SharedClock, Simulator, SystemClock};
use tlog_store::{HistoryManager, LogDir, Startup};

/// tlog-logger - records one sample per minute into daily history files.
#[derive(Parser, Debug)]
#[command(name = "tlog-logger")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log directory (overrides config).
    #[arg(short, long, global = true, env = "TLOG_DIR")]
    dir: Option<PathBuf>,

    /// Sampling interval in seconds (overrides config).
    #[arg(short, long, global = true)]
    interval: Option<u64>,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the logger in the foreground (default behavior).
    Run,

    /// Print the effective configuration as TOML.
    ShowConfig,

    /// Write a default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    match args.command {
        Some(Command::ShowConfig) => {
            let config = load_config(&args)?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Some(Command::InitConfig { force }) => init_config(args.config, force),
        Some(Command::Run) | None => run_logger(args).await,
    }
}

fn init_tracing(args: &Args) -> anyhow::Result<()> {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("tlog_logger={level}").parse()?)
                .add_directive(format!("tlog_store={level}").parse()?),
        )
        .init();
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(dir) = &args.dir {
        config.storage.dir = dir.clone();
    }
    if let Some(interval) = args.interval {
        config.sampling.interval_secs = interval;
    }

    config.validate()?;
    Ok(config)
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(tlog_logger::config::default_config_path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn run_logger(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    let clock: SharedClock = Arc::new(
        SystemClock::new(config.clock.utc_offset_minutes)
            .context("invalid clock.utc_offset_minutes")?,
    );

    let dir = LogDir::new(&config.storage.dir);
    dir.ensure_root()
        .with_context(|| format!("cannot use log directory {}", config.storage.dir.display()))?;
    info!("Logging to {}", config.storage.dir.display());

    let mut history = HistoryManager::new(dir, Arc::clone(&clock));
    match history.init().context("history logging unavailable")? {
        Startup::Resumed { reconciliation, .. } => info!(
            "Resumed today's log at minute {}",
            reconciliation.current_minute
        ),
        Startup::Fresh => info!("Starting a new log for today"),
    }

    let simulator = Arc::new(Simulator::new(&config.simulator));
    let state = AppState::new(history, config);

    let cancel = CancellationToken::new();
    let collector = Collector::new(Arc::clone(&state), simulator.clone(), simulator);
    let handle = collector.start(cancel.clone());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutting down");
    cancel.cancel();
    handle.await?;

    let counters = &state.counters;
    info!(
        "Recorded {} samples ({} failures, {} checkpoints, {} rollovers)",
        counters.samples(),
        counters.failures(),
        counters.checkpoints(),
        counters.rollovers()
    );
    Ok(())
}
