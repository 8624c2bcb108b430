//! Subsystem adapters exposing their counters as metric sources.

pub mod custom;
pub mod logger;
pub mod system;
pub mod thread_pool;

pub use custom::CustomMetrics;
pub use logger::{LogCounterLayer, LogCounters, LoggerSource};
pub use system::SystemResourceSource;
pub use thread_pool::{InstrumentedPool, PoolStats, ThreadPoolSource};
