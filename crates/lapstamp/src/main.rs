mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lapstamp_core::config;
use lapstamp_core::pipeline::{self, RunConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();
    let config_path = Path::new(config::CONFIG_FILE);

    if cli.rebuild_config {
        config::rebuild(config_path)?;
        println!("Config rebuilt using defaults. Exiting...");
        return Ok(());
    }

    let overlay_config = config::load_or_init(config_path)?;

    // clap enforces these unless --rebuild-config was given.
    let interval_seconds = cli.interval.context("--interval is required")?;
    let input = cli.input.context("input path is required")?;
    let output = cli
        .output
        .unwrap_or_else(|| pipeline::default_output_path(&input));

    let run_config = RunConfig {
        interval_seconds,
        input,
        output,
        max_frames: cli.max_frames,
    };

    let frames = pipeline::run(&overlay_config, &run_config).context("pipeline failed")?;

    info!(
        frames,
        output = ?run_config.output,
        "timestamped video written"
    );

    Ok(())
}
