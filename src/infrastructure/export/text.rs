//! Prometheus exposition text rendering for snapshots.

use crate::domain::metrics::{MetricPoint, MetricsSnapshot};
use crate::domain::ports::SnapshotExporter;
use std::collections::HashMap;
use std::fmt::Write;

const HELP_TEXT: &str = "Metric reported by a registered source";

/// Renders snapshots in the line-oriented exposition format.
///
/// Names appear in first-seen order, each preceded by `# HELP` and
/// `# TYPE ... gauge` lines. Tags are emitted sorted by key and no timestamps
/// are written: the scrape time is authoritative.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExporter;

impl SnapshotExporter for TextExporter {
    fn render(&self, snapshot: Option<&MetricsSnapshot>) -> String {
        render_text(snapshot)
    }

    fn content_type(&self) -> &'static str {
        "text/plain; version=0.0.4"
    }
}

pub fn render_text(snapshot: Option<&MetricsSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return String::new();
    };

    // Group points by name, keeping first-seen order.
    let mut families: Vec<(&str, Vec<&MetricPoint>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for point in snapshot.points() {
        match index.get(point.name.as_str()) {
            Some(&i) => families[i].1.push(point),
            None => {
                index.insert(point.name.as_str(), families.len());
                families.push((point.name.as_str(), vec![point]));
            }
        }
    }

    let mut out = String::new();
    for (name, points) in families {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "# HELP {} {}", name, HELP_TEXT);
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for point in points {
            out.push_str(name);
            if !point.tags.is_empty() {
                out.push('{');
                for (i, (key, value)) in point.tags.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}=\"{}\"", key, escape_label_value(value));
                }
                out.push('}');
            }
            out.push(' ');
            out.push_str(&format_value(point.value));
            out.push('\n');
        }
    }
    out
}

/// Shortest decimal that round-trips, never in exponent form.
pub(crate) fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{}", value)
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}
