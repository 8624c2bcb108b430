use std::sync::Arc;
use std::time::Duration;
use sysbridge::application::system::{
    CUSTOM_SOURCE, Coordinator, LOGGER_SOURCE, MONITORING_SOURCE, THREAD_POOL_SOURCE,
};
use sysbridge::config::Config;
use sysbridge::infrastructure::sources::LogCounters;
use tokio_test::assert_ok;
use tracing::Level;

fn test_config() -> Config {
    let mut config = Config::default();
    config.subsystems.thread_pool_workers = 2;
    config.observability.enabled = false;
    config
}

#[tokio::test]
async fn test_all_subsystems_report() {
    let counters = Arc::new(LogCounters::new());
    counters.record(&Level::INFO);
    counters.record(&Level::ERROR);

    let coordinator = Coordinator::build(test_config(), Some(counters)).unwrap();
    assert_ok!(coordinator.attach().await);
    coordinator
        .custom_metrics()
        .set_gauge("orders_open", 7.0, &[("desk", "fx")])
        .unwrap();

    let snapshot = coordinator.collect_now().await.unwrap();
    let groups: Vec<&str> = snapshot.groups().iter().map(|g| g.source.as_str()).collect();
    assert_eq!(
        groups,
        vec![THREAD_POOL_SOURCE, LOGGER_SOURCE, MONITORING_SOURCE, CUSTOM_SOURCE]
    );

    let pool = snapshot.points_for(THREAD_POOL_SOURCE);
    let workers = pool.iter().find(|p| p.name == "thread_pool_workers").unwrap();
    assert_eq!(workers.value, 2.0);

    let logger = snapshot.points_for(LOGGER_SOURCE);
    let errors = logger.iter().find(|p| p.name == "log_errors_total").unwrap();
    assert_eq!(errors.value, 1.0);

    let monitoring = snapshot.points_for(MONITORING_SOURCE);
    assert!(monitoring.iter().any(|p| p.name == "system_memory_total_bytes"));

    let custom = snapshot.points_for(CUSTOM_SOURCE);
    assert_eq!(custom[0].tags.get("desk").map(String::as_str), Some("fx"));

    coordinator.detach().await;
}

#[tokio::test]
async fn test_pool_work_is_visible_in_next_snapshot() {
    let mut config = test_config();
    config.subsystems.monitoring_enabled = false;
    let coordinator = Coordinator::build(config, None).unwrap();
    coordinator.attach().await.unwrap();

    let pool = coordinator.thread_pool().unwrap().clone();
    let (tx, rx) = std::sync::mpsc::channel();
    for _ in 0..3 {
        let tx = tx.clone();
        pool.spawn(move || {
            let _ = tx.send(());
        });
    }
    for _ in 0..3 {
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    // The completed counter is bumped after the task body returns.
    let mut completed = 0.0;
    for _ in 0..50 {
        let snapshot = coordinator.collect_now().await.unwrap();
        completed = snapshot
            .points_for(THREAD_POOL_SOURCE)
            .iter()
            .find(|p| p.name == "thread_pool_tasks_completed")
            .map(|p| p.value)
            .unwrap_or_default();
        if completed == 3.0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(completed, 3.0);
}

#[tokio::test]
async fn test_detach_stops_collection() {
    let coordinator = Coordinator::build(test_config(), None).unwrap();
    coordinator.attach().await.unwrap();
    coordinator.collect_now().await.unwrap();

    coordinator.detach().await;
    assert!(coordinator.aggregator().source_names().await.is_empty());
    assert!(coordinator.collect_now().await.is_err());
    assert_eq!(coordinator.export_text().await, "");

    // Re-attaching brings every adapter back.
    coordinator.attach().await.unwrap();
    assert_eq!(coordinator.aggregator().source_names().await.len(), 3);
}

#[tokio::test]
async fn test_start_with_textfile_sink_writes_exposition() {
    let dir = std::env::temp_dir().join(format!("sysbridge-coord-{}", std::process::id()));
    let path = dir.join("metrics.prom");

    let mut config = test_config();
    config.subsystems.monitoring_enabled = false;
    config.observability.enabled = true;
    config.observability.log_json = false;
    config.observability.interval = Duration::from_millis(20);
    config.observability.textfile_path = Some(path.clone());

    let coordinator = Coordinator::build(config, None).unwrap();
    coordinator
        .custom_metrics()
        .set_gauge("heartbeat", 1.0, &[])
        .unwrap();
    let handle = coordinator.start().await.unwrap();
    assert!(handle.is_reporting());

    let mut contents = String::new();
    for _ in 0..100 {
        if let Ok(text) = tokio::fs::read_to_string(&path).await {
            contents = text;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.stop().await;
    coordinator.detach().await;

    assert!(contents.contains("# TYPE heartbeat gauge\nheartbeat 1\n"));
    let _ = std::fs::remove_dir_all(&dir);
}
