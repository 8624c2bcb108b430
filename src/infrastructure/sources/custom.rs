use crate::domain::errors::MetricError;
use crate::domain::metrics::MetricPoint;
use crate::domain::ports::MetricSource;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Application-defined values, reported in insertion order.
///
/// A value is identified by its name together with its tags; setting an
/// existing series overwrites it in place.
#[derive(Debug, Default)]
pub struct CustomMetrics {
    series: RwLock<Vec<MetricPoint>>,
}

impl CustomMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a series to `value`, creating it if needed
    pub fn set_gauge(
        &self,
        name: &str,
        value: f64,
        tags: &[(&str, &str)],
    ) -> Result<(), MetricError> {
        let point = Self::build(name, value, tags)?;
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        match series
            .iter_mut()
            .find(|p| p.name == point.name && p.tags == point.tags)
        {
            Some(existing) => existing.value = point.value,
            None => series.push(point),
        }
        Ok(())
    }

    /// Add `delta` to a series, starting from zero if it does not exist.
    /// Returns the new value.
    pub fn increment(
        &self,
        name: &str,
        delta: f64,
        tags: &[(&str, &str)],
    ) -> Result<f64, MetricError> {
        let point = Self::build(name, delta, tags)?;
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        match series
            .iter_mut()
            .find(|p| p.name == point.name && p.tags == point.tags)
        {
            Some(existing) => {
                existing.value += delta;
                Ok(existing.value)
            }
            None => {
                series.push(point);
                Ok(delta)
            }
        }
    }

    /// Remove every series named `name`. Returns how many were removed.
    pub fn remove(&self, name: &str) -> usize {
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        let before = series.len();
        series.retain(|p| p.name != name);
        before - series.len()
    }

    pub fn len(&self) -> usize {
        self.series.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build(name: &str, value: f64, tags: &[(&str, &str)]) -> Result<MetricPoint, MetricError> {
        let tags: BTreeMap<String, String> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let point = MetricPoint {
            name: name.to_string(),
            value,
            tags,
            timestamp: None,
        };
        point.validate()?;
        Ok(point)
    }
}

impl MetricSource for CustomMetrics {
    fn snapshot(&self) -> Vec<MetricPoint> {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_gauge_overwrites_same_series() {
        let custom = CustomMetrics::new();
        custom.set_gauge("queue_depth", 3.0, &[("queue", "io")]).unwrap();
        custom.set_gauge("queue_depth", 7.0, &[("queue", "io")]).unwrap();
        custom.set_gauge("queue_depth", 1.0, &[("queue", "cpu")]).unwrap();

        let points = custom.snapshot();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 7.0);
        assert_eq!(points[1].tags.get("queue").map(String::as_str), Some("cpu"));
    }

    #[test]
    fn test_increment_accumulates() {
        let custom = CustomMetrics::new();
        assert_eq!(custom.increment("requests_total", 1.0, &[]).unwrap(), 1.0);
        assert_eq!(custom.increment("requests_total", 2.5, &[]).unwrap(), 3.5);
        assert_eq!(custom.snapshot()[0].value, 3.5);
    }

    #[test]
    fn test_rejects_invalid_names() {
        let custom = CustomMetrics::new();
        assert_eq!(
            custom.set_gauge("bad.name", 1.0, &[]),
            Err(MetricError::InvalidName {
                name: "bad.name".to_string()
            })
        );
        assert!(custom.set_gauge("ok", 1.0, &[("bad key", "v")]).is_err());
        assert!(custom.is_empty());
    }

    #[test]
    fn test_remove_drops_all_series_for_name() {
        let custom = CustomMetrics::new();
        custom.set_gauge("a", 1.0, &[("k", "1")]).unwrap();
        custom.set_gauge("a", 2.0, &[("k", "2")]).unwrap();
        custom.set_gauge("b", 3.0, &[]).unwrap();

        assert_eq!(custom.remove("a"), 2);
        assert_eq!(custom.remove("missing"), 0);
        assert_eq!(custom.len(), 1);
    }
}
