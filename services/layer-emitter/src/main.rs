//! Avalanche forecast layer emitter.
//!
//! Renders a fetched results document into per-day shapefiles, Mapnik
//! styles and HTML legends for the tile server.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use layer_emitter::{EmitterConfig, Overrides};

#[derive(Parser, Debug)]
#[command(name = "layer-emitter")]
#[command(about = "Builds avalanche forecast map layers from a results document")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "FORECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Results document (JSON, keyed by day)
    #[arg(short, long)]
    results: Option<PathBuf>,

    /// Output directory for layer files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// File to touch once layers are written
    #[arg(long)]
    reload_trigger: Option<PathBuf>,

    /// Only emit these days (repeatable)
    #[arg(short, long = "day")]
    days: Vec<String>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = EmitterConfig::from_env();
    if let Some(path) = &args.config {
        config = config.merge_yaml_file(path)?;
    }
    let config = config.with_overrides(Overrides {
        results_path: args.results,
        output_dir: args.output_dir,
        reload_trigger: args.reload_trigger,
        log_level: args.log_level,
    });

    // Initialize tracing; RUST_LOG takes precedence when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!(
        results = ?config.results_path,
        output_dir = %config.output_dir.display(),
        reload_trigger = ?config.reload_trigger,
        "Starting avalanche forecast layer emitter"
    );

    layer_emitter::run(&config, &args.days)?;

    Ok(())
}
