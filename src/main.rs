use anyhow::{Context, Result};
use camsync::{load_sources, Config, Supervisor};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Record IP camera streams to disk with ffmpeg
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Service config file, extension optional
    #[arg(short, long, default_value = "config/camsync")]
    config: String,

    /// Source list (JSON); overrides `sources.path` from the config
    #[arg(short, long)]
    sources: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config))?;

    let sources_path = args.sources.unwrap_or_else(|| cfg.sources.path.clone());
    let sources = load_sources(&sources_path)
        .with_context(|| format!("Invalid source list {}", sources_path.display()))?;

    info!("camsync v{}", env!("CARGO_PKG_VERSION"));
    info!("Recording tool: {}", cfg.recorder.program);
    info!("Output root: {}", cfg.recorder.working_dir.display());

    let mut supervisor = Supervisor::initialize(sources, cfg.supervisor_settings())
        .context("Failed to start supervisor")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Ctrl-C received, shutting down");
    supervisor.shutdown();

    for stats in supervisor.stats() {
        info!(
            "{}: {} cycle(s), {} launch failure(s), last exit {:?}",
            stats.name, stats.cycles, stats.launch_failures, stats.last_exit_code
        );
    }

    Ok(())
}
