//! Push-based observability for the aggregation pipeline
//!
//! This module provides observability through **outbound data only** - no HTTP server,
//! no incoming requests. Snapshots are pushed via:
//!
//! 1. **Structured JSON Logs**: Periodic JSON output to stdout (for Loki, Fluentd, CloudWatch)
//! 2. **Text file** (optional): Exposition format file for textfile-style scrapers
//!
//! The aggregator's own health is tracked in a private Prometheus registry.

pub mod metrics;
pub mod pass_timer;
pub mod reporter;
pub mod sinks;

pub use metrics::CollectorMetrics;
pub use pass_timer::PassTimer;
pub use reporter::MetricsReporter;
pub use sinks::{LogSink, TextFileSink};
