//! Snapshot sinks for push-based reporting
//!
//! Sinks only SEND data: a log line on stdout or a text file that a node
//! exporter style scraper can pick up.

use crate::domain::metrics::MetricsSnapshot;
use crate::domain::ports::MetricsSink;
use crate::infrastructure::export::{render_json, render_text};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prints each snapshot as a `METRICS_JSON:` prefixed line on stdout
pub struct LogSink;

#[async_trait]
impl MetricsSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        // Use a special prefix so logs can be easily filtered
        println!("METRICS_JSON:{}", render_json(Some(snapshot)));
        info!(
            "Snapshot: {} points | {} sources | {} skipped",
            snapshot.len(),
            snapshot.groups().len(),
            snapshot.skipped_sources().len()
        );
        Ok(())
    }
}

/// Writes the exposition text of each snapshot to a file.
///
/// The file is replaced atomically: content goes to `<path>.tmp` first and
/// is then renamed over `<path>`.
pub struct TextFileSink {
    path: PathBuf,
}

impl TextFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl MetricsSink for TextFileSink {
    fn name(&self) -> &str {
        "textfile"
    }

    async fn publish(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, render_text(Some(snapshot)))
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::MetricPoint;
    use chrono::Utc;

    #[tokio::test]
    async fn test_log_sink_publishes() {
        let snapshot = MetricsSnapshot::from_points(Utc::now(), vec![MetricPoint::new("a", 1.0)]);
        assert!(LogSink.publish(&snapshot).await.is_ok());
    }

    #[tokio::test]
    async fn test_text_file_sink_replaces_content() {
        let dir = std::env::temp_dir().join(format!("sysbridge-textfile-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let sink = TextFileSink::new(dir.join("metrics.prom"));

        let first = MetricsSnapshot::from_points(Utc::now(), vec![MetricPoint::new("a", 1.0)]);
        sink.publish(&first).await.unwrap();
        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert!(content.contains("a 1\n"));

        let second = MetricsSnapshot::from_points(Utc::now(), vec![MetricPoint::new("b", 2.0)]);
        sink.publish(&second).await.unwrap();
        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert!(!content.contains("a 1\n"));
        assert!(content.contains("b 2\n"));
        assert!(!sink.tmp_path().exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
