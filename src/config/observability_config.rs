//! Observability configuration parsing from environment variables.
//!
//! This module handles loading periodic collection and sink settings.

use super::env_parse::{parse_bool, parse_u64};
use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Observability environment configuration
#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    pub interval: Duration,
    pub log_json: bool,
    pub textfile_path: Option<PathBuf>,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            log_json: true,
            textfile_path: None,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Result<Self> {
        let interval_secs = parse_u64("OBSERVABILITY_INTERVAL", 60)?;
        if interval_secs == 0 {
            bail!("OBSERVABILITY_INTERVAL must be greater than 0");
        }

        Ok(Self {
            enabled: parse_bool("OBSERVABILITY_ENABLED", true),
            interval: Duration::from_secs(interval_secs),
            log_json: parse_bool("OBSERVABILITY_LOG_JSON", true),
            textfile_path: env::var("OBSERVABILITY_TEXTFILE_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}
