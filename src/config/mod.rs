//! Configuration module for sysbridge.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Aggregator, Subsystems, and Observability.

mod aggregator_config;
mod env_parse;
mod observability_config;
mod subsystem_config;

pub use aggregator_config::AggregatorEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use subsystem_config::SubsystemEnvConfig;

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub aggregator: AggregatorEnvConfig,
    pub subsystems: SubsystemEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let aggregator =
            AggregatorEnvConfig::from_env().context("Failed to load aggregator config")?;
        let subsystems =
            SubsystemEnvConfig::from_env().context("Failed to load subsystem config")?;
        let observability =
            ObservabilityEnvConfig::from_env().context("Failed to load observability config")?;

        Ok(Self {
            aggregator,
            subsystems,
            observability,
        })
    }
}
