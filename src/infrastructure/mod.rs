pub mod export;
pub mod observability;
pub mod sources;
