mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use better_core::{load_config, load_config_or_default, validate_config, Transcoder};
use cli::{Cli, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        // stdout carries the --json report
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            load_config_or_default(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
    };
    if let Some(jobs) = cli.jobs {
        config.transcode = config.transcode.with_max_parallel(jobs);
    }
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Using {} parallel pipelines (flac: {:?}, sox: {:?}, lame: {:?})",
        config.transcode.parallelism(),
        config.tools.flac,
        config.tools.sox,
        config.tools.lame
    );

    let transcoder = Transcoder::new(config);
    let report = transcoder
        .transcode(&cli.source, &cli.destination, cli.format)
        .await
        .with_context(|| {
            format!(
                "Failed to transcode {} to {}",
                cli.source.display(),
                cli.format
            )
        })?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    }

    info!(
        "Wrote {} {} tracks and {} other files to {} in {:.1}s",
        report.tracks,
        report.format,
        report.ancillary.copied.len(),
        cli.destination.display(),
        report.duration_ms as f64 / 1000.0
    );
    Ok(())
}
