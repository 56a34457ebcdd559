use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ArchivalConfig;
use crate::errors::{AdMetricsError, Result};
use crate::metrics_core::MetricsRecorder;
use crate::storage::AdRepository;

/// 单次归档报告
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveReport {
    pub cutoff: DateTime<Utc>,
    pub archived: u64,
    pub duration: StdDuration,
}

/// 归档任务
///
/// 进程内的多次运行由 `run_lock` 串行化。
pub struct ArchivalTask {
    storage: Arc<dyn AdRepository>,
    metrics: Arc<dyn MetricsRecorder>,
    retention: Duration,
    batch_size: u64,
    run_lock: Mutex<()>,
}

/// 把保留天数换算成时长，超出可表示的时间范围时报错
pub fn retention_from_days(days: u64) -> Result<Duration> {
    i64::try_from(days)
        .ok()
        .and_then(Duration::try_days)
        .filter(|retention| Utc::now().checked_sub_signed(*retention).is_some())
        .ok_or_else(|| {
            AdMetricsError::invalid_argument(format!(
                "archival.retention_days out of range: {}",
                days
            ))
        })
}

impl ArchivalTask {
    pub fn new(
        storage: Arc<dyn AdRepository>,
        metrics: Arc<dyn MetricsRecorder>,
        config: &ArchivalConfig,
    ) -> Result<Self> {
        Ok(Self {
            storage,
            metrics,
            retention: retention_from_days(config.retention_days)?,
            batch_size: config.batch_size,
            run_lock: Mutex::new(()),
        })
    }

    /// 以 now − retention 为截止时间运行一次
    pub async fn run_once(&self) -> Result<ArchiveReport> {
        let cutoff = Utc::now().checked_sub_signed(self.retention).ok_or_else(|| {
            AdMetricsError::invalid_argument("archival cutoff is out of range")
        })?;
        self.archive_before(cutoff).await
    }

    /// 移动 `timestamp < cutoff` 的全部点击
    pub async fn archive_before(&self, cutoff: DateTime<Utc>) -> Result<ArchiveReport> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();

        match self
            .storage
            .archive_clicks_before(cutoff, self.batch_size)
            .await
        {
            Ok(archived) => {
                let report = ArchiveReport {
                    cutoff,
                    archived,
                    duration: started.elapsed(),
                };
                self.metrics.inc_archive_run("success");
                self.metrics.add_archived_clicks(archived);
                info!(
                    "Archival run finished: {} clicks older than {} moved in {:?}",
                    report.archived,
                    report.cutoff.to_rfc3339(),
                    report.duration
                );
                Ok(report)
            }
            Err(e) => {
                self.metrics.inc_archive_run("failure");
                Err(e)
            }
        }
    }

    /// 启动后台归档任务
    ///
    /// 只在两次运行之间检查关闭信号，正在进行的归档会完整提交或回滚。
    pub fn spawn(
        self: Arc<Self>,
        interval: StdDuration,
        initial_delay: StdDuration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let interval = interval.max(StdDuration::from_secs(1));

        let handle = tokio::spawn(async move {
            if !initial_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => {
                        info!("Archival task stopped before first run");
                        return;
                    }
                    _ = tokio::time::sleep(initial_delay) => {}
                }
            }

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {}
                }

                if *shutdown.borrow() {
                    break;
                }

                if let Err(e) = self.run_once().await {
                    error!("Archival run failed, will retry next tick: {}", e);
                }
            }

            info!("Archival task stopped");
        });

        info!(
            "Archival background task started (interval: {:?}, initial delay: {:?})",
            interval, initial_delay
        );
        handle
    }
}
