// Snapshot aggregation over registered metric sources
pub mod aggregator;

pub use aggregator::{AggregatorConfig, MetricsAggregator};
