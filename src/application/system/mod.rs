use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::aggregation::MetricsAggregator;
use crate::config::Config;
use crate::domain::errors::AggregatorError;
use crate::domain::metrics::MetricsSnapshot;
use crate::domain::ports::{MetricSource, MetricsSink};
use crate::infrastructure::observability::{LogSink, MetricsReporter, TextFileSink};
use crate::infrastructure::sources::{
    CustomMetrics, InstrumentedPool, LogCounters, LoggerSource, SystemResourceSource,
    ThreadPoolSource,
};

pub const THREAD_POOL_SOURCE: &str = "thread_pool";
pub const LOGGER_SOURCE: &str = "logger";
pub const MONITORING_SOURCE: &str = "monitoring";
pub const CUSTOM_SOURCE: &str = "custom";

/// Owns the subsystem adapters and wires them into one aggregator.
///
/// Adapters live exactly as long as the coordinator; the aggregator only
/// holds weak references to them.
pub struct Coordinator {
    config: Config,
    aggregator: Arc<MetricsAggregator>,
    thread_pool: Option<Arc<InstrumentedPool>>,
    thread_pool_source: Option<Arc<ThreadPoolSource>>,
    logger_source: Option<Arc<LoggerSource>>,
    monitoring_source: Option<Arc<SystemResourceSource>>,
    custom: Arc<CustomMetrics>,
}

/// Running periodic collection; dropping it without `stop` leaves the
/// reporter task running until the runtime shuts down.
pub struct CoordinatorHandle {
    shutdown_tx: watch::Sender<bool>,
    reporter: Option<JoinHandle<()>>,
}

impl CoordinatorHandle {
    pub fn is_reporting(&self) -> bool {
        self.reporter.is_some()
    }

    /// Signal the reporter to stop and wait for it
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(reporter) = self.reporter {
            if let Err(e) = reporter.await {
                warn!("Coordinator: Reporter task ended abnormally: {}", e);
            }
        }
    }
}

impl Coordinator {
    /// Build adapters for every enabled subsystem.
    ///
    /// `log_counters` are the counters fed by the process-wide
    /// `LogCounterLayer`; without them the logger adapter is not created.
    pub fn build(config: Config, log_counters: Option<Arc<LogCounters>>) -> Result<Self> {
        info!("Building coordinator...");

        let aggregator = Arc::new(
            MetricsAggregator::new(config.aggregator.to_aggregator_config())
                .context("Failed to create metrics aggregator")?,
        );

        let (thread_pool, thread_pool_source) = if config.subsystems.thread_pool_enabled {
            let pool = Arc::new(InstrumentedPool::new(config.subsystems.thread_pool_workers)?);
            let source = Arc::new(ThreadPoolSource::new(pool.clone()));
            (Some(pool), Some(source))
        } else {
            info!("Coordinator: Thread pool disabled");
            (None, None)
        };

        let logger_source = match (config.subsystems.logger_enabled, log_counters) {
            (true, Some(counters)) => Some(Arc::new(LoggerSource::new(counters))),
            (true, None) => {
                warn!("Coordinator: Logger enabled but no log counters installed");
                None
            }
            (false, _) => None,
        };

        let monitoring_source = if config.subsystems.monitoring_enabled {
            Some(Arc::new(SystemResourceSource::new()))
        } else {
            info!("Coordinator: Monitoring disabled");
            None
        };

        Ok(Self {
            config,
            aggregator,
            thread_pool,
            thread_pool_source,
            logger_source,
            monitoring_source,
            custom: Arc::new(CustomMetrics::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aggregator(&self) -> &Arc<MetricsAggregator> {
        &self.aggregator
    }

    /// Worker pool, if the thread pool subsystem is enabled
    pub fn thread_pool(&self) -> Option<&Arc<InstrumentedPool>> {
        self.thread_pool.as_ref()
    }

    pub fn custom_metrics(&self) -> &Arc<CustomMetrics> {
        &self.custom
    }

    /// Every known adapter with its metric source, or `None` when that
    /// subsystem is disabled. Order is the registration order.
    pub fn adapters(&self) -> Vec<(&'static str, Option<Arc<dyn MetricSource>>)> {
        vec![
            (
                THREAD_POOL_SOURCE,
                self.thread_pool_source
                    .clone()
                    .map(|s| s as Arc<dyn MetricSource>),
            ),
            (
                LOGGER_SOURCE,
                self.logger_source
                    .clone()
                    .map(|s| s as Arc<dyn MetricSource>),
            ),
            (
                MONITORING_SOURCE,
                self.monitoring_source
                    .clone()
                    .map(|s| s as Arc<dyn MetricSource>),
            ),
            (
                CUSTOM_SOURCE,
                Some(self.custom.clone() as Arc<dyn MetricSource>),
            ),
        ]
    }

    /// Register every live adapter and initialize the aggregator.
    /// Adapters already registered are left in place.
    pub async fn attach(&self) -> Result<()> {
        let registered = self.aggregator.source_names().await;
        for (name, source) in self.adapters() {
            let Some(source) = source else {
                continue;
            };
            if registered.iter().any(|n| n == name) {
                continue;
            }
            self.aggregator
                .register_dyn_source(name, &source)
                .await
                .with_context(|| format!("Failed to register source {}", name))?;
        }
        self.aggregator.initialize().await;
        Ok(())
    }

    /// Unregister every adapter and shut the aggregator down
    pub async fn detach(&self) {
        for (name, _) in self.adapters() {
            self.aggregator.unregister_source(name).await;
        }
        self.aggregator.shutdown().await;
        info!("Coordinator: Detached all sources");
    }

    /// Attach and, if observability is enabled, spawn periodic collection
    pub async fn start(&self) -> Result<CoordinatorHandle> {
        self.attach().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reporter = if self.config.observability.enabled {
            let reporter = MetricsReporter::new(
                self.aggregator.clone(),
                self.sinks(),
                self.config.observability.interval,
            );
            Some(tokio::spawn(reporter.run(shutdown_rx)))
        } else {
            info!("Coordinator: Periodic collection disabled");
            None
        };

        Ok(CoordinatorHandle {
            shutdown_tx,
            reporter,
        })
    }

    fn sinks(&self) -> Vec<Arc<dyn MetricsSink>> {
        let mut sinks: Vec<Arc<dyn MetricsSink>> = Vec::new();
        if self.config.observability.log_json {
            sinks.push(Arc::new(LogSink));
        }
        if let Some(path) = &self.config.observability.textfile_path {
            sinks.push(Arc::new(TextFileSink::new(path.clone())));
        }
        sinks
    }

    /// On-demand collection pass
    pub async fn collect_now(&self) -> Result<Arc<MetricsSnapshot>, AggregatorError> {
        self.aggregator.collect().await
    }

    pub async fn export_text(&self) -> String {
        self.aggregator.export_text().await
    }

    pub async fn export_json(&self) -> String {
        self.aggregator.export_json().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.subsystems.thread_pool_workers = 1;
        config.subsystems.monitoring_enabled = false;
        config.observability.enabled = false;
        config
    }

    #[test]
    fn test_disabled_subsystems_have_no_source() {
        let coordinator = Coordinator::build(quiet_config(), None).unwrap();
        let adapters = coordinator.adapters();

        let names: Vec<&str> = adapters.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["thread_pool", "logger", "monitoring", "custom"]);
        assert!(adapters[0].1.is_some());
        // Logger has no counters, monitoring is disabled.
        assert!(adapters[1].1.is_none());
        assert!(adapters[2].1.is_none());
        assert!(adapters[3].1.is_some());
    }

    #[tokio::test]
    async fn test_attach_is_repeatable() {
        let coordinator = Coordinator::build(quiet_config(), None).unwrap();
        coordinator.attach().await.unwrap();
        coordinator.attach().await.unwrap();

        assert_eq!(
            coordinator.aggregator().source_names().await,
            vec!["thread_pool".to_string(), "custom".to_string()]
        );
        assert!(coordinator.aggregator().is_initialized().await);
    }

    #[tokio::test]
    async fn test_start_without_observability_does_not_report() {
        let coordinator = Coordinator::build(quiet_config(), None).unwrap();
        let handle = coordinator.start().await.unwrap();
        assert!(!handle.is_reporting());
        handle.stop().await;
    }
}
