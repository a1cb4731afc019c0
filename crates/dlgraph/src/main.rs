//! Main entry point for dlgraph.

use anyhow::Context;
use clap::Parser;
use dlgraph::{App, Cli, RunReport};
use dlgraph_common::{init_logging, LoggingConfig};
use dlgraph_config::ConfigLoader;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) if report.success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunReport> {
    let config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let mut logging = LoggingConfig::from(&config.logging);
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
        logging.respect_env = false;
    }
    init_logging(&logging).context("Failed to initialize logging")?;

    let options = cli.run_options();
    if options.subjects.is_empty() {
        warn!("No subject selected, pass --releases, --themes, --plugins or --all");
    }
    info!(subjects = ?options.subjects, acquisition = ?options.acquisition, "Starting dlgraph");

    let app = App::new(config, options).context("Failed to set up dlgraph")?;
    let report = app.run().await;

    for outcome in &report.outcomes {
        if let Some(e) = &outcome.error {
            eprintln!("{}: {e}", outcome.subject);
        }
    }
    for chart in report.charts() {
        println!("{}", chart.display());
    }

    Ok(report)
}
