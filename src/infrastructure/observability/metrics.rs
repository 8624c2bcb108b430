//! Prometheus self-metrics for the aggregation pipeline
//!
//! All metrics use the `sysbridge_` prefix and describe the aggregator itself,
//! not the subsystems it collects from.

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Counters and timings describing collection passes
#[derive(Clone)]
pub struct CollectorMetrics {
    registry: Arc<Registry>,
    /// Completed collection passes
    pub collections_total: Counter,
    /// Passes rejected or discarded (not initialized, shutdown mid-pass)
    pub collection_failures_total: Counter,
    /// Sources skipped because they exceeded the per-source timeout
    pub source_timeouts_total: CounterVec,
    /// Sources skipped because they panicked or were released
    pub source_failures_total: CounterVec,
    /// Points dropped for failing name validation
    pub invalid_points_total: CounterVec,
    /// Number of points in the latest snapshot
    pub snapshot_points: Gauge,
    /// Number of currently registered sources
    pub registered_sources: Gauge,
    /// Wall time of a collection pass in seconds
    pub collection_duration_seconds: Histogram,
}

impl CollectorMetrics {
    /// Create a new instance with every metric registered on a private registry
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let collections_total = Counter::with_opts(Opts::new(
            "sysbridge_collections_total",
            "Total completed collection passes",
        ))?;
        registry.register(Box::new(collections_total.clone()))?;

        let collection_failures_total = Counter::with_opts(Opts::new(
            "sysbridge_collection_failures_total",
            "Total collection passes rejected or discarded",
        ))?;
        registry.register(Box::new(collection_failures_total.clone()))?;

        let source_timeouts_total = CounterVec::new(
            Opts::new(
                "sysbridge_source_timeouts_total",
                "Total per-source snapshot calls abandoned after the timeout",
            ),
            &["source"],
        )?;
        registry.register(Box::new(source_timeouts_total.clone()))?;

        let source_failures_total = CounterVec::new(
            Opts::new(
                "sysbridge_source_failures_total",
                "Total per-source snapshot calls that panicked or found the source released",
            ),
            &["source"],
        )?;
        registry.register(Box::new(source_failures_total.clone()))?;

        let invalid_points_total = CounterVec::new(
            Opts::new(
                "sysbridge_invalid_points_total",
                "Total points dropped for invalid metric names or tag keys",
            ),
            &["source"],
        )?;
        registry.register(Box::new(invalid_points_total.clone()))?;

        let snapshot_points = Gauge::with_opts(Opts::new(
            "sysbridge_snapshot_points",
            "Number of points in the latest snapshot",
        ))?;
        registry.register(Box::new(snapshot_points.clone()))?;

        let registered_sources = Gauge::with_opts(Opts::new(
            "sysbridge_registered_sources",
            "Number of registered metric sources",
        ))?;
        registry.register(Box::new(registered_sources.clone()))?;

        let collection_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "sysbridge_collection_duration_seconds",
                "Collection pass duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(collection_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            collections_total,
            collection_failures_total,
            source_timeouts_total,
            source_failures_total,
            invalid_points_total,
            snapshot_points,
            registered_sources,
            collection_duration_seconds,
        })
    }

    /// Render all self-metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_source_timeout(&self, source: &str) {
        self.source_timeouts_total.with_label_values(&[source]).inc();
    }

    pub fn inc_source_failure(&self, source: &str) {
        self.source_failures_total.with_label_values(&[source]).inc();
    }

    pub fn add_invalid_points(&self, source: &str, count: usize) {
        self.invalid_points_total
            .with_label_values(&[source])
            .inc_by(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = CollectorMetrics::new().expect("Failed to create metrics");
        assert!(metrics.render().contains("sysbridge_"));
    }

    #[test]
    fn test_instances_are_independent() {
        let first = CollectorMetrics::new().expect("Failed to create metrics");
        let second = CollectorMetrics::new().expect("Failed to create metrics");
        first.collections_total.inc();
        assert_eq!(first.collections_total.get(), 1.0);
        assert_eq!(second.collections_total.get(), 0.0);
    }

    #[test]
    fn test_source_timeouts_are_labelled() {
        let metrics = CollectorMetrics::new().expect("Failed to create metrics");
        metrics.inc_source_timeout("monitoring");
        metrics.inc_source_timeout("monitoring");
        let output = metrics.render();
        assert!(output.contains("sysbridge_source_timeouts_total{source=\"monitoring\"} 2"));
    }
}
