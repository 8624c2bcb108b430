//! Host resource source backed by the sysinfo crate

use crate::domain::metrics::MetricPoint;
use crate::domain::ports::MetricSource;
use std::sync::Mutex;
use sysinfo::System;
use tracing::warn;

/// Reports host CPU and memory utilisation.
///
/// CPU usage is computed between consecutive refreshes, so the first
/// snapshot after construction reads 0.
pub struct SystemResourceSource {
    system: Mutex<System>,
}

impl SystemResourceSource {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemResourceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for SystemResourceSource {
    fn snapshot(&self) -> Vec<MetricPoint> {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("SystemResourceSource: Sampler lock poisoned, reporting nothing");
                return Vec::new();
            }
        };
        system.refresh_cpu_usage();
        system.refresh_memory();

        let total = system.total_memory();
        let used = system.used_memory();
        let memory_pct = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        vec![
            MetricPoint::new("system_cpu_usage_percent", system.global_cpu_usage() as f64),
            MetricPoint::new("system_memory_usage_percent", memory_pct),
            MetricPoint::new("system_memory_used_bytes", used as f64),
            MetricPoint::new("system_memory_total_bytes", total as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_cpu_and_memory() {
        let source = SystemResourceSource::new();
        let points = source.snapshot();

        let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "system_cpu_usage_percent",
                "system_memory_usage_percent",
                "system_memory_used_bytes",
                "system_memory_total_bytes",
            ]
        );
        let memory_pct = points[1].value;
        assert!((0.0..=100.0).contains(&memory_pct));
        assert!(points.iter().all(|p| p.validate().is_ok()));
    }
}
