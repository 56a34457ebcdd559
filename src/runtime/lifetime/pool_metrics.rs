//! Database pool metrics
//!
//! A background task periodically copies the pool snapshot into the
//! `database_connections` gauge.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::metrics_core::MetricsRecorder;
use crate::storage::AdRepository;

/// 刷新间隔
const UPDATE_INTERVAL_SECS: u64 = 15;

/// 把当前连接池快照写入指标
pub fn record_pool_stats(storage: &dyn AdRepository, metrics: &dyn MetricsRecorder) {
    if let Some(stats) = storage.pool_stats() {
        trace!(
            "Database pool: {} open, {} idle, {} in use",
            stats.size,
            stats.idle,
            stats.in_use()
        );
        metrics.set_db_connections(f64::from(stats.in_use()));
    }
}

/// 启动连接池指标刷新任务，收到关闭信号后退出
pub fn spawn_pool_metrics_updater(
    storage: Arc<dyn AdRepository>,
    metrics: Arc<dyn MetricsRecorder>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(UPDATE_INTERVAL_SECS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown.borrow() {
                break;
            }
            record_pool_stats(storage.as_ref(), metrics.as_ref());
        }
        debug!("Pool metrics updater stopped");
    })
}
