use chrono::Utc;
use futures_util::future::join_all;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::errors::{AggregatorError, SourceError};
use crate::domain::metrics::{MetricPoint, MetricsSnapshot};
use crate::domain::ports::MetricSource;
use crate::infrastructure::export::{render_json, render_text};
use crate::infrastructure::observability::{CollectorMetrics, PassTimer};

/// Aggregator tuning
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Maximum time a single source's `snapshot()` may take before it is
    /// skipped for the current pass
    pub source_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_millis(1000),
        }
    }
}

#[derive(Clone)]
struct SourceEntry {
    id: u64,
    name: String,
    source: Weak<dyn MetricSource>,
    /// Set while a `snapshot()` call for this source occupies a blocking thread
    in_flight: Arc<AtomicBool>,
}

/// Clears a source's in-flight flag when its blocking call ends, including
/// by panic or by the task being dropped unstarted.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct AggregatorState {
    initialized: bool,
    last_snapshot: Option<Arc<MetricsSnapshot>>,
}

enum SourcePoll {
    Reported(Vec<MetricPoint>),
    /// Unregistered after the pass started
    Excluded,
    Failed(SourceError),
}

/// Collects points from registered sources into immutable snapshots.
///
/// Sources are held by `Weak` reference: their owner decides how long they
/// live. Passes are serialized; readers of the cached snapshot only ever wait
/// for a pointer swap.
pub struct MetricsAggregator {
    config: AggregatorConfig,
    sources: RwLock<Vec<SourceEntry>>,
    state: RwLock<AggregatorState>,
    collection_lock: Mutex<()>,
    next_id: AtomicU64,
    metrics: CollectorMetrics,
}

impl MetricsAggregator {
    pub fn new(config: AggregatorConfig) -> anyhow::Result<Self> {
        Ok(Self::with_metrics(config, CollectorMetrics::new()?))
    }

    pub fn with_metrics(config: AggregatorConfig, metrics: CollectorMetrics) -> Self {
        Self {
            config,
            sources: RwLock::new(Vec::new()),
            state: RwLock::new(AggregatorState::default()),
            collection_lock: Mutex::new(()),
            next_id: AtomicU64::new(0),
            metrics,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Self-metrics describing collection passes
    pub fn collector_metrics(&self) -> &CollectorMetrics {
        &self.metrics
    }

    /// Register a source under `name`. The aggregator keeps only a weak
    /// reference; dropping the last `Arc` effectively retires the source.
    pub async fn register_source<S>(
        &self,
        name: impl Into<String>,
        source: &Arc<S>,
    ) -> Result<(), AggregatorError>
    where
        S: MetricSource + 'static,
    {
        let weak: Weak<S> = Arc::downgrade(source);
        self.insert_source(name.into(), weak).await
    }

    /// Same as `register_source`, for sources already erased to a trait object.
    pub async fn register_dyn_source(
        &self,
        name: impl Into<String>,
        source: &Arc<dyn MetricSource>,
    ) -> Result<(), AggregatorError> {
        self.insert_source(name.into(), Arc::downgrade(source)).await
    }

    async fn insert_source(
        &self,
        name: String,
        source: Weak<dyn MetricSource>,
    ) -> Result<(), AggregatorError> {
        let mut sources = self.sources.write().await;
        if sources.iter().any(|entry| entry.name == name) {
            warn!("MetricsAggregator: Rejected duplicate source '{}'", name);
            return Err(AggregatorError::DuplicateSource { name });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!("MetricsAggregator: Registered source '{}'", name);
        sources.push(SourceEntry {
            id,
            name,
            source,
            in_flight: Arc::new(AtomicBool::new(false)),
        });
        self.metrics.registered_sources.set(sources.len() as f64);
        Ok(())
    }

    /// Remove a source by name. Returns false if nothing was registered
    /// under that name.
    pub async fn unregister_source(&self, name: &str) -> bool {
        let mut sources = self.sources.write().await;
        let before = sources.len();
        sources.retain(|entry| entry.name != name);
        let removed = sources.len() != before;
        self.metrics.registered_sources.set(sources.len() as f64);
        if removed {
            info!("MetricsAggregator: Unregistered source '{}'", name);
        }
        removed
    }

    /// Names of registered sources in registration order
    pub async fn source_names(&self) -> Vec<String> {
        self.sources
            .read()
            .await
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub async fn initialize(&self) {
        let mut state = self.state.write().await;
        if !state.initialized {
            state.initialized = true;
            info!("MetricsAggregator: Initialized");
        }
    }

    /// Return to the uninitialized state and drop the cached snapshot.
    /// Registered sources stay registered.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if state.initialized {
            info!("MetricsAggregator: Shut down");
        }
        state.initialized = false;
        state.last_snapshot = None;
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    /// Run one collection pass and publish its snapshot.
    ///
    /// Sources are polled concurrently, each on the blocking pool under the
    /// configured timeout; slow, panicking or released sources are skipped
    /// and the pass still succeeds with the remaining points.
    pub async fn collect(&self) -> Result<Arc<MetricsSnapshot>, AggregatorError> {
        if !self.is_initialized().await {
            self.metrics.collection_failures_total.inc();
            return Err(AggregatorError::NotInitialized);
        }

        let _pass = self.collection_lock.lock().await;
        let timer = PassTimer::start(self.metrics.collection_duration_seconds.clone());

        let entries: Vec<SourceEntry> = self.sources.read().await.clone();

        let polls = join_all(entries.iter().map(|entry| self.poll_source(entry))).await;

        let mut groups = Vec::with_capacity(entries.len());
        let mut skipped = Vec::new();
        for (SourceEntry { name, .. }, poll) in entries.into_iter().zip(polls) {
            match poll {
                SourcePoll::Reported(points) => {
                    let points = self.retain_valid(&name, points);
                    groups.push((name, points));
                }
                SourcePoll::Excluded => {
                    debug!("MetricsAggregator: Source '{}' unregistered mid-pass", name);
                }
                SourcePoll::Failed(err) => {
                    warn!("MetricsAggregator: Skipping source for this pass: {}", err);
                    match err {
                        SourceError::Timeout { .. } => {
                            self.metrics.inc_source_timeout(err.source_name())
                        }
                        _ => self.metrics.inc_source_failure(err.source_name()),
                    }
                    skipped.push(name);
                }
            }
        }

        let collected_at = Utc::now();
        for (_, points) in groups.iter_mut() {
            for point in points.iter_mut() {
                point.timestamp.get_or_insert(collected_at);
            }
        }
        let snapshot = Arc::new(MetricsSnapshot::from_groups(collected_at, groups, skipped));

        let mut state = self.state.write().await;
        if !state.initialized {
            self.metrics.collection_failures_total.inc();
            warn!("MetricsAggregator: Shutdown during collection, discarding snapshot");
            timer.discard();
            return Err(AggregatorError::NotInitialized);
        }
        state.last_snapshot = Some(snapshot.clone());
        drop(state);

        self.metrics.collections_total.inc();
        self.metrics.snapshot_points.set(snapshot.len() as f64);
        debug!(
            "MetricsAggregator: Collected {} points from {} sources in {:?} ({} skipped)",
            snapshot.len(),
            snapshot.groups().len(),
            timer.elapsed(),
            snapshot.skipped_sources().len()
        );

        Ok(snapshot)
    }

    async fn is_registered(&self, id: u64) -> bool {
        self.sources.read().await.iter().any(|entry| entry.id == id)
    }

    /// Call one source on the blocking pool.
    ///
    /// A source unregistered before the pass reaches it is never called, and
    /// one unregistered while its call runs has its points dropped. Removal
    /// racing the start of the call may still let that call run once, but
    /// its result never reaches a snapshot. A source whose previous call is
    /// still running is not called again; it counts as timed out, so a hung
    /// source holds at most one blocking thread.
    async fn poll_source(&self, entry: &SourceEntry) -> SourcePoll {
        if !self.is_registered(entry.id).await {
            return SourcePoll::Excluded;
        }

        let timed_out = || {
            SourcePoll::Failed(SourceError::Timeout {
                name: entry.name.clone(),
                timeout_ms: self.config.source_timeout.as_millis() as u64,
            })
        };

        let Some(source) = entry.source.upgrade() else {
            return SourcePoll::Failed(SourceError::Released {
                name: entry.name.clone(),
            });
        };

        if entry.in_flight.swap(true, Ordering::AcqRel) {
            debug!(
                "MetricsAggregator: Source '{}' still busy with a previous call",
                entry.name
            );
            return timed_out();
        }
        let guard = InFlightGuard(entry.in_flight.clone());

        let call = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            source.snapshot()
        });
        match tokio::time::timeout(self.config.source_timeout, call).await {
            Ok(Ok(points)) => {
                if self.is_registered(entry.id).await {
                    SourcePoll::Reported(points)
                } else {
                    SourcePoll::Excluded
                }
            }
            Ok(Err(join_err)) => SourcePoll::Failed(SourceError::Panicked {
                name: entry.name.clone(),
                reason: join_err.to_string(),
            }),
            Err(_) => timed_out(),
        }
    }

    fn retain_valid(&self, source: &str, points: Vec<MetricPoint>) -> Vec<MetricPoint> {
        let total = points.len();
        let valid: Vec<MetricPoint> = points
            .into_iter()
            .filter(|point| match point.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("MetricsAggregator: Dropping point from '{}': {}", source, e);
                    false
                }
            })
            .collect();

        let dropped = total - valid.len();
        if dropped > 0 {
            self.metrics.add_invalid_points(source, dropped);
        }
        valid
    }

    /// Most recent snapshot, or an empty one if nothing has been collected
    /// since the last `initialize()`.
    pub async fn last_snapshot(&self) -> Arc<MetricsSnapshot> {
        self.state
            .read()
            .await
            .last_snapshot
            .clone()
            .unwrap_or_else(|| Arc::new(MetricsSnapshot::empty()))
    }

    async fn cached_snapshot(&self) -> Option<Arc<MetricsSnapshot>> {
        self.state.read().await.last_snapshot.clone()
    }

    /// Last snapshot in exposition text format
    pub async fn export_text(&self) -> String {
        render_text(self.cached_snapshot().await.as_deref())
    }

    /// Last snapshot as a JSON document
    pub async fn export_json(&self) -> String {
        render_json(self.cached_snapshot().await.as_deref())
    }
}
