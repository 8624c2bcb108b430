use crate::domain::metrics::MetricPoint;
use crate::domain::ports::MetricSource;
use anyhow::{Context, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};

#[derive(Debug, Default)]
struct PoolCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    queued: AtomicU64,
}

/// Point-in-time view of pool activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub queued: u64,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

/// A `rayon` pool that counts the work passing through it.
///
/// Scheduling is entirely rayon's; this wrapper only observes submission,
/// start and completion of each task.
pub struct InstrumentedPool {
    pool: rayon::ThreadPool,
    counters: Arc<PoolCounters>,
}

impl InstrumentedPool {
    /// Build a pool with `workers` threads (0 = rayon's default, one per CPU)
    pub fn new(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sysbridge-worker-{}", i))
            .build()
            .context("Failed to build worker thread pool")?;

        info!(
            "InstrumentedPool: Started with {} workers",
            pool.current_num_threads()
        );

        Ok(Self {
            pool,
            counters: Arc::new(PoolCounters::default()),
        })
    }

    /// Queue a task. A panicking task is counted as failed and does not take
    /// the worker down.
    pub fn spawn<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let counters = self.counters.clone();
        counters.submitted.fetch_add(1, Ordering::Relaxed);
        counters.queued.fetch_add(1, Ordering::Relaxed);

        self.pool.spawn(move || {
            counters.queued.fetch_sub(1, Ordering::Relaxed);
            match catch_unwind(AssertUnwindSafe(task)) {
                Ok(()) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    error!("InstrumentedPool: Task panicked");
                }
            }
        });
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.workers(),
            queued: self.counters.queued.load(Ordering::Relaxed),
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

/// Metric source adapter for the worker pool
pub struct ThreadPoolSource {
    pool: Arc<InstrumentedPool>,
}

impl ThreadPoolSource {
    pub fn new(pool: Arc<InstrumentedPool>) -> Self {
        Self { pool }
    }
}

impl MetricSource for ThreadPoolSource {
    fn snapshot(&self) -> Vec<MetricPoint> {
        let stats = self.pool.stats();
        vec![
            MetricPoint::new("thread_pool_workers", stats.workers as f64),
            MetricPoint::new("thread_pool_queue_size", stats.queued as f64),
            MetricPoint::new("thread_pool_tasks_submitted", stats.submitted as f64),
            MetricPoint::new("thread_pool_tasks_completed", stats.completed as f64),
            MetricPoint::new("thread_pool_tasks_failed", stats.failed as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_pool_counts_completed_and_failed_tasks() {
        let pool = InstrumentedPool::new(2).unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 0..4 {
            let tx = tx.clone();
            pool.spawn(move || {
                if i == 3 {
                    let _ = tx.send(());
                    panic!("boom");
                }
                let _ = tx.send(());
            });
        }
        for _ in 0..4 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }

        // Counters are bumped right after the task body returns.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while pool.stats().completed + pool.stats().failed < 4 {
            assert!(std::time::Instant::now() < deadline, "tasks did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }

        let stats = pool.stats();
        assert_eq!(stats.workers, 2);
        assert_eq!(stats.submitted, 4);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.queued, 0);
    }

    #[test]
    fn test_source_reports_pool_metrics() {
        let pool = Arc::new(InstrumentedPool::new(1).unwrap());
        let source = ThreadPoolSource::new(pool);
        let points = source.snapshot();

        let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "thread_pool_workers",
                "thread_pool_queue_size",
                "thread_pool_tasks_submitted",
                "thread_pool_tasks_completed",
                "thread_pool_tasks_failed",
            ]
        );
        assert_eq!(points[0].value, 1.0);
    }
}
