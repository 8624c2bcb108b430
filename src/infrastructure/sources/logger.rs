use crate::domain::metrics::MetricPoint;
use crate::domain::ports::MetricSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

/// Event counters shared between the logging layer and its metric source
#[derive(Debug, Default)]
pub struct LogCounters {
    by_level: [AtomicU64; 5],
}

impl LogCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(level: &Level) -> usize {
        LEVELS.iter().position(|l| l == level).unwrap_or(LEVELS.len() - 1)
    }

    pub fn record(&self, level: &Level) {
        self.by_level[Self::slot(level)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, level: &Level) -> u64 {
        self.by_level[Self::slot(level)].load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.by_level.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn errors(&self) -> u64 {
        self.count(&Level::ERROR)
    }
}

/// `tracing-subscriber` layer counting every event that passes the filters
/// stacked before it
#[derive(Clone)]
pub struct LogCounterLayer {
    counters: Arc<LogCounters>,
}

impl LogCounterLayer {
    pub fn new(counters: Arc<LogCounters>) -> Self {
        Self { counters }
    }
}

impl<S: Subscriber> Layer<S> for LogCounterLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.counters.record(event.metadata().level());
    }
}

/// Metric source adapter for the logger
pub struct LoggerSource {
    counters: Arc<LogCounters>,
}

impl LoggerSource {
    pub fn new(counters: Arc<LogCounters>) -> Self {
        Self { counters }
    }
}

impl MetricSource for LoggerSource {
    fn snapshot(&self) -> Vec<MetricPoint> {
        let mut points = vec![
            MetricPoint::new("log_messages_total", self.counters.total() as f64),
            MetricPoint::new("log_errors_total", self.counters.errors() as f64),
        ];
        for level in LEVELS.iter() {
            points.push(
                MetricPoint::new("log_messages_by_level", self.counters.count(level) as f64)
                    .with_tag("level", level.as_str().to_lowercase()),
            );
        }
        points
    }
}
