#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the fire count generator.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fire_map_cli::{PipelineConfig, PipelineError, run};

#[derive(Parser)]
#[command(
    name = "fire_map",
    about = "District-level fire counts for Punjab and Haryana from NASA FIRMS"
)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Local fire point file (`.shp` or `.geojson`); skips the download
    #[arg(long)]
    points: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    let cli = Cli::parse();

    log::info!("Fire detection data processor: Punjab & Haryana agricultural fires");
    log::info!("Data source: NASA FIRMS VIIRS (NOAA-20)");

    let result = match PipelineConfig::resolve(cli.config.as_deref(), cli.points) {
        Ok(config) => run(&config).await,
        Err(e) => Err(PipelineError::from(e)),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}
