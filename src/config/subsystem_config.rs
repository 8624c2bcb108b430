//! Subsystem configuration parsing from environment variables.
//!
//! Each subsystem adapter can be switched off; a disabled subsystem simply
//! contributes no metric source.

use super::env_parse::{parse_bool, parse_usize};
use anyhow::Result;

/// Subsystem environment configuration
#[derive(Debug, Clone)]
pub struct SubsystemEnvConfig {
    pub thread_pool_enabled: bool,
    /// 0 lets rayon pick one worker per CPU
    pub thread_pool_workers: usize,
    pub logger_enabled: bool,
    pub monitoring_enabled: bool,
}

impl Default for SubsystemEnvConfig {
    fn default() -> Self {
        Self {
            thread_pool_enabled: true,
            thread_pool_workers: 0,
            logger_enabled: true,
            monitoring_enabled: true,
        }
    }
}

impl SubsystemEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            thread_pool_enabled: parse_bool("THREAD_POOL_ENABLED", true),
            thread_pool_workers: parse_usize("THREAD_POOL_WORKERS", 0)?,
            logger_enabled: parse_bool("LOGGER_ENABLED", true),
            monitoring_enabled: parse_bool("MONITORING_ENABLED", true),
        })
    }
}
