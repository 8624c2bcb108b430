//! Metric data model: individual points and immutable snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

use crate::domain::errors::MetricError;

/// A single measurement reported by a metric source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub name: String,
    pub value: f64,
    /// Sorted by key so every consumer sees the same order
    pub tags: BTreeMap<String, String>,
    /// Filled with the snapshot's collection time when the source leaves it empty
    pub timestamp: Option<DateTime<Utc>>,
}

impl MetricPoint {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            tags: BTreeMap::new(),
            timestamp: None,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check the name and every tag key against the identifier grammar.
    pub fn validate(&self) -> Result<(), MetricError> {
        if !is_valid_metric_name(&self.name) {
            return Err(MetricError::InvalidName {
                name: self.name.clone(),
            });
        }
        if let Some(key) = self.tags.keys().find(|k| !is_valid_metric_name(k)) {
            return Err(MetricError::InvalidTagKey {
                name: self.name.clone(),
                key: key.clone(),
            });
        }
        Ok(())
    }
}

/// Returns true if `name` is non-empty, made of ASCII letters, digits and
/// underscores, and does not start with a digit.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Contiguous run of points contributed by one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub source: String,
    pub start: usize,
    pub len: usize,
}

impl SourceGroup {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Immutable result of one collection pass.
///
/// Points are ordered by source registration order, then by emission order
/// within each source. A snapshot is never modified after construction; a new
/// pass always produces a new value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsSnapshot {
    points: Vec<MetricPoint>,
    groups: Vec<SourceGroup>,
    skipped_sources: Vec<String>,
    collected_at: Option<DateTime<Utc>>,
}

impl MetricsSnapshot {
    /// Snapshot returned before any collection pass has completed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from per-source point groups, in the order given.
    /// Sources that reported nothing get no group.
    pub fn from_groups(
        collected_at: DateTime<Utc>,
        groups: Vec<(String, Vec<MetricPoint>)>,
        skipped_sources: Vec<String>,
    ) -> Self {
        let mut points = Vec::new();
        let mut source_groups = Vec::new();

        for (source, group_points) in groups {
            if group_points.is_empty() {
                continue;
            }
            source_groups.push(SourceGroup {
                source,
                start: points.len(),
                len: group_points.len(),
            });
            points.extend(group_points);
        }

        Self {
            points,
            groups: source_groups,
            skipped_sources,
            collected_at: Some(collected_at),
        }
    }

    /// Build a snapshot from a flat list of points without source attribution.
    pub fn from_points(collected_at: DateTime<Utc>, points: Vec<MetricPoint>) -> Self {
        Self {
            points,
            groups: Vec::new(),
            skipped_sources: Vec::new(),
            collected_at: Some(collected_at),
        }
    }

    pub fn points(&self) -> &[MetricPoint] {
        &self.points
    }

    pub fn collected_at(&self) -> Option<DateTime<Utc>> {
        self.collected_at
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    /// Points contributed by `source`, empty if it reported nothing.
    pub fn points_for(&self, source: &str) -> &[MetricPoint] {
        self.groups
            .iter()
            .find(|g| g.source == source)
            .map(|g| &self.points[g.range()])
            .unwrap_or(&[])
    }

    /// Sources that timed out, panicked or were released during the pass.
    pub fn skipped_sources(&self) -> &[String] {
        &self.skipped_sources
    }
}
