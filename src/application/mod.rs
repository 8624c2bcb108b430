// Snapshot aggregation
pub mod aggregation;

// System coordinator
pub mod system;
