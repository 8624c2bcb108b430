//! Periodic collection and push-based reporting
//!
//! Drives `MetricsAggregator::collect()` on a fixed interval and hands each
//! new snapshot to the configured sinks.
//!
//! **Security**: This system only SENDS data, never accepts requests.

use crate::application::aggregation::MetricsAggregator;
use crate::domain::errors::AggregatorError;
use crate::domain::metrics::MetricsSnapshot;
use crate::domain::ports::MetricsSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Push-based metrics reporter
pub struct MetricsReporter {
    aggregator: Arc<MetricsAggregator>,
    sinks: Vec<Arc<dyn MetricsSink>>,
    interval: Duration,
}

impl MetricsReporter {
    /// Create a new metrics reporter
    ///
    /// # Arguments
    /// * `aggregator` - Aggregator to collect from
    /// * `sinks` - Destinations for each snapshot
    /// * `interval` - Time between collection passes
    pub fn new(
        aggregator: Arc<MetricsAggregator>,
        sinks: Vec<Arc<dyn MetricsSink>>,
        interval: Duration,
    ) -> Self {
        Self {
            aggregator,
            sinks,
            interval,
        }
    }

    /// Run one collection pass and publish the result to every sink.
    ///
    /// Returns `None` when the aggregator is not initialized.
    pub async fn report_once(&self) -> Option<Arc<MetricsSnapshot>> {
        let snapshot = match self.aggregator.collect().await {
            Ok(snapshot) => snapshot,
            Err(AggregatorError::NotInitialized) => {
                debug!("MetricsReporter: Aggregator not initialized, skipping tick");
                return None;
            }
            Err(e) => {
                warn!("MetricsReporter: Failed to collect metrics: {}", e);
                return None;
            }
        };

        for sink in &self.sinks {
            if let Err(e) = sink.publish(&snapshot).await {
                warn!("MetricsReporter: Sink '{}' failed: {:#}", sink.name(), e);
            }
        }

        Some(snapshot)
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "MetricsReporter: Starting periodic collection (interval: {:?}, sinks: {})",
            self.interval,
            self.sinks.len()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first pass
        // happens one interval after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.report_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("MetricsReporter: Stopped");
    }
}
