//! Aggregator configuration parsing from environment variables.

use super::env_parse::parse_u64;
use crate::application::aggregation::AggregatorConfig;
use anyhow::{Result, bail};
use std::time::Duration;

/// Aggregator environment configuration
#[derive(Debug, Clone)]
pub struct AggregatorEnvConfig {
    pub source_timeout_ms: u64,
}

impl Default for AggregatorEnvConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 1000,
        }
    }
}

impl AggregatorEnvConfig {
    pub fn from_env() -> Result<Self> {
        let source_timeout_ms = parse_u64("AGGREGATOR_SOURCE_TIMEOUT_MS", 1000)?;
        if source_timeout_ms == 0 {
            bail!("AGGREGATOR_SOURCE_TIMEOUT_MS must be greater than 0");
        }
        Ok(Self { source_timeout_ms })
    }

    pub fn to_aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            source_timeout: Duration::from_millis(self.source_timeout_ms),
        }
    }
}
