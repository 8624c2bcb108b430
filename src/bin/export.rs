//! One-shot snapshot export
//!
//! Attaches every enabled subsystem, runs a collection pass and prints the
//! result in the requested format.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use sysbridge::application::system::Coordinator;
use sysbridge::config::Config;
use sysbridge::infrastructure::sources::{LogCounterLayer, LogCounters};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(author, version, about = "Collect one metrics snapshot and print it", long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Delay between a warm-up pass and the reported pass, so CPU usage has
    /// a sampling window
    #[arg(long, default_value = "250")]
    warmup_ms: u64,

    /// Append the aggregator's own Prometheus metrics (text format only)
    #[arg(long)]
    self_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the export.
    let log_counters = Arc::new(LogCounters::new());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(LogCounterLayer::new(log_counters.clone()))
        .init();

    let config = Config::from_env()?;
    let coordinator = Coordinator::build(config, Some(log_counters))?;
    coordinator.attach().await?;

    if cli.warmup_ms > 0 {
        coordinator
            .collect_now()
            .await
            .context("Warm-up collection failed")?;
        tokio::time::sleep(Duration::from_millis(cli.warmup_ms)).await;
    }

    let snapshot = coordinator
        .collect_now()
        .await
        .context("Collection failed")?;
    info!("Collected {} points", snapshot.len());

    match cli.format {
        Format::Text => {
            print!("{}", coordinator.export_text().await);
            if cli.self_metrics {
                print!("{}", coordinator.aggregator().collector_metrics().render());
            }
        }
        Format::Json => println!("{}", coordinator.export_json().await),
    }

    coordinator.detach().await;
    Ok(())
}
