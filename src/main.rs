//! dash-plot
//!
//! # Architecture Overview
//!
//! ```text
//!   dashboards (*.json | URLs)         Prometheus
//!            │                              ▲
//!            ▼                              │ query_range
//!   ┌──────────────┐   ┌───────┐   ┌────────┴───────┐   ┌──────────┐
//!   │  extractor   │──▶│ queue │──▶│ workers × N    │──▶│ PngDir/  │
//!   │ (blocking)   │   │bounded│   │ fetch/sanitize │   │ name.png │
//!   └──────────────┘   └───────┘   │ render/persist │   └──────────┘
//!                                  └────────────────┘
//!         ▲                                 ▲
//!         └──────── Shutdown (signals) ─────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use dash_plot::cli::Cli;
use dash_plot::config::{finalize, read_or_default, RunConfig};
use dash_plot::lifecycle::{self, signals, Shutdown};
use dash_plot::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dash-plot: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dash-plot starting");
    tracing::info!(
        address = %config.backend.address,
        workers = config.pipeline.workers,
        queue_capacity = config.pipeline.queue_capacity,
        "Configuration loaded"
    );

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(cli: Cli) -> dash_plot::Result<RunConfig> {
    let file = read_or_default(cli.config.as_deref())?;
    Ok(finalize(cli.apply(file))?)
}

async fn run(config: RunConfig) -> dash_plot::Result<()> {
    let shutdown = Shutdown::new();
    let listener = signals::spawn_listener(shutdown.clone());

    let prepared = lifecycle::prepare(&config).await?;
    let (pipeline, workload) = prepared.into_pipeline(shutdown.clone());
    let outcome = pipeline.run(workload).await;
    listener.abort();
    let summary = outcome?;

    if shutdown.is_triggered() {
        tracing::warn!(%summary, "Run cancelled");
    } else {
        tracing::info!(%summary, "Run complete");
    }
    Ok(())
}
