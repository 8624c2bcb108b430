use crate::domain::metrics::{MetricPoint, MetricsSnapshot};
use anyhow::Result;
use async_trait::async_trait;

/// A subsystem that can report its current numeric state on demand.
///
/// Implementations must be read-only with respect to the subsystem, safe to
/// call concurrently with its normal operation, and must never block
/// indefinitely. A source that cannot report right now returns an empty vec.
pub trait MetricSource: Send + Sync {
    fn snapshot(&self) -> Vec<MetricPoint>;
}

/// Renders a snapshot into an external format.
///
/// `None` means no snapshot has been collected yet; implementations render a
/// minimal valid document in that case.
pub trait SnapshotExporter: Send + Sync {
    fn render(&self, snapshot: Option<&MetricsSnapshot>) -> String;
    fn content_type(&self) -> &'static str;
}

/// Destination for snapshots produced by periodic collection
#[async_trait]
pub trait MetricsSink: Send + Sync {
    fn name(&self) -> &str;
    async fn publish(&self, snapshot: &MetricsSnapshot) -> Result<()>;
}
