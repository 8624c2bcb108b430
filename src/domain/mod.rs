// Metric points and snapshots
pub mod metrics;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
