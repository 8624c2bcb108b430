//! sysbridge Server - long-running metrics aggregation
//!
//! Wires the thread pool, logger and monitoring adapters into one aggregator
//! and collects on a fixed interval. Snapshots are pushed via structured JSON
//! logs to stdout and, optionally, an exposition text file.
//!
//! # Usage
//! ```sh
//! OBSERVABILITY_INTERVAL=15 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `AGGREGATOR_SOURCE_TIMEOUT_MS` - Per-source snapshot timeout (default: 1000)
//! - `THREAD_POOL_ENABLED`, `LOGGER_ENABLED`, `MONITORING_ENABLED` - Subsystem switches (default: true)
//! - `OBSERVABILITY_ENABLED` - Enable periodic collection (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between collections (default: 60)
//! - `OBSERVABILITY_TEXTFILE_PATH` - Write exposition text to this file (default: unset)

use anyhow::Result;
use std::sync::Arc;
use sysbridge::application::system::Coordinator;
use sysbridge::config::Config;
use sysbridge::infrastructure::sources::{LogCounterLayer, LogCounters};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Setup logging (stdout + counters for the logger adapter)
    let log_counters = Arc::new(LogCounters::new());
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .with(LogCounterLayer::new(log_counters.clone()))
        .init();

    info!("sysbridge Server {} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: source_timeout={}ms, interval={:?}, thread_pool={}, logger={}, monitoring={}",
        config.aggregator.source_timeout_ms,
        config.observability.interval,
        config.subsystems.thread_pool_enabled,
        config.subsystems.logger_enabled,
        config.subsystems.monitoring_enabled
    );

    let coordinator = Coordinator::build(config, Some(log_counters))?;
    let handle = coordinator.start().await?;
    info!(
        "Sources attached: {:?}",
        coordinator.aggregator().source_names().await
    );

    info!("Server running. Press Ctrl+C to shutdown.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping...");

    handle.stop().await;
    coordinator.detach().await;

    Ok(())
}
