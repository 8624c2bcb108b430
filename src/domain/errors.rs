use thiserror::Error;

/// Errors returned to callers of the metrics aggregator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("Aggregator is not initialized")]
    NotInitialized,

    #[error("Metric source already registered: {name}")]
    DuplicateSource { name: String },
}

/// Per-source failures during a collection pass.
///
/// These never fail a pass: the offending source is skipped and the
/// snapshot is published without its points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Source {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("Source {name} panicked: {reason}")]
    Panicked { name: String, reason: String },

    #[error("Source {name} was released by its owner")]
    Released { name: String },
}

impl SourceError {
    pub fn source_name(&self) -> &str {
        match self {
            SourceError::Timeout { name, .. }
            | SourceError::Panicked { name, .. }
            | SourceError::Released { name } => name,
        }
    }
}

/// Errors related to metric definitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("Invalid metric name: {name:?}")]
    InvalidName { name: String },

    #[error("Invalid tag key {key:?} on metric {name}")]
    InvalidTagKey { name: String, key: String },
}
