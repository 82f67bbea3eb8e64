mod cli;
mod config;
mod error;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use metricsnap_core::{Exporter, Reporter};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Diagnostics go to stderr; stdout carries only the report.
fn init_tracing(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = format!("warn,metricsnap={level},metricsnap_core={level},metricsnap_api={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&path)?;
    let export = config::resolve(&cfg, &cli, &path)?;
    let url = export.url.to_string();

    tracing::debug!(
        url = %url,
        schedule = ?export.schedule,
        format = ?export.format,
        window = %humantime::format_duration(export.window),
        "starting export"
    );

    let started = Instant::now();
    let reporter = Arc::new(Reporter::stdout(export.format));
    let exporter =
        Exporter::connect(&export, reporter).map_err(|e| CliError::from_core(e, &url))?;
    let summary = exporter
        .run(&export.credentials)
        .await
        .map_err(|e| CliError::from_core(e, &url))?;

    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        devices = summary.devices,
        objects = summary.objects,
        indicators = summary.indicators,
        samples = summary.samples,
        "export took {}",
        humantime::format_duration(Duration::from_millis(elapsed))
    );
    if !summary.is_complete() {
        warn!(
            failed_fetches = summary.failed_fetches,
            failed_writes = summary.failed_writes,
            panicked_workers = summary.panicked_workers,
            "export incomplete, some subtrees were skipped"
        );
    }

    Ok(())
}
