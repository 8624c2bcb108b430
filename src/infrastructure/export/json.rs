//! JSON document rendering for snapshots.

use crate::domain::metrics::{MetricPoint, MetricsSnapshot};
use crate::domain::ports::SnapshotExporter;
use chrono::SecondsFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

const EMPTY_DOCUMENT: &str = r#"{"timestamp":null,"metrics":[]}"#;

#[derive(Serialize)]
struct JsonDocument<'a> {
    /// RFC 3339, UTC, millisecond precision
    timestamp: Option<String>,
    metrics: Vec<JsonMetric<'a>>,
}

#[derive(Serialize)]
struct JsonMetric<'a> {
    name: &'a str,
    value: f64,
    tags: &'a BTreeMap<String, String>,
}

/// Renders snapshots as a single compact JSON object.
///
/// Metrics are sorted by name, then by tags, so the same snapshot always
/// produces the same bytes. Non-finite values serialize as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl SnapshotExporter for JsonExporter {
    fn render(&self, snapshot: Option<&MetricsSnapshot>) -> String {
        render_json(snapshot)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

pub fn render_json(snapshot: Option<&MetricsSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return EMPTY_DOCUMENT.to_string();
    };

    let mut points: Vec<&MetricPoint> = snapshot.points().iter().collect();
    points.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.tags.cmp(&b.tags)));

    let document = JsonDocument {
        timestamp: snapshot
            .collected_at()
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        metrics: points
            .into_iter()
            .map(|p| JsonMetric {
                name: &p.name,
                value: p.value,
                tags: &p.tags,
            })
            .collect(),
    };

    match serde_json::to_string(&document) {
        Ok(json) => json,
        Err(e) => {
            error!("JsonExporter: Failed to serialize snapshot: {}", e);
            EMPTY_DOCUMENT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(points: Vec<MetricPoint>) -> MetricsSnapshot {
        let at = Utc.with_ymd_and_hms(2026, 1, 10, 10, 0, 0).unwrap();
        MetricsSnapshot::from_points(at, points)
    }

    #[test]
    fn test_render_without_snapshot() {
        assert_eq!(render_json(None), r#"{"timestamp":null,"metrics":[]}"#);
        assert_eq!(
            render_json(Some(&MetricsSnapshot::empty())),
            r#"{"timestamp":null,"metrics":[]}"#
        );
    }

    #[test]
    fn test_render_sorted_by_name_then_tags() {
        let snap = snapshot(vec![
            MetricPoint::new("tasks_completed", 5.0),
            MetricPoint::new("cpu_usage_percent", 42.5).with_tag("host", "n2"),
            MetricPoint::new("cpu_usage_percent", 40.0).with_tag("host", "n1"),
        ]);

        assert_eq!(
            render_json(Some(&snap)),
            concat!(
                r#"{"timestamp":"2026-01-10T10:00:00.000Z","metrics":["#,
                r#"{"name":"cpu_usage_percent","value":40.0,"tags":{"host":"n1"}},"#,
                r#"{"name":"cpu_usage_percent","value":42.5,"tags":{"host":"n2"}},"#,
                r#"{"name":"tasks_completed","value":5.0,"tags":{}}"#,
                r#"]}"#
            )
        );
    }

    #[test]
    fn test_non_finite_values_become_null() {
        let snap = snapshot(vec![MetricPoint::new("ratio", f64::NAN)]);
        let value: serde_json::Value = serde_json::from_str(&render_json(Some(&snap))).unwrap();
        assert!(value["metrics"][0]["value"].is_null());
    }

    #[test]
    fn test_render_is_deterministic() {
        let snap = snapshot(vec![
            MetricPoint::new("b", 1.0).with_tag("z", "1").with_tag("a", "2"),
            MetricPoint::new("a", 2.0),
        ]);
        assert_eq!(render_json(Some(&snap)), render_json(Some(&snap)));
    }
}
