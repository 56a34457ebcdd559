use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::archive::ArchivalTask;
use crate::metrics_core::{MetricsRecorder, default_recorder};
use crate::storage::{AdRepository, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<dyn AdRepository>,
    pub metrics: Arc<dyn MetricsRecorder>,
    /// 归档关闭时为 None
    pub archival: Option<Arc<ArchivalTask>>,
}

/// 准备服务器启动的上下文
/// 包括存储、指标和归档任务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let config = crate::config::get_config();
    let metrics = default_recorder();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let archival = if config.archival.enabled {
        info!(
            "Archival enabled: retention {} days, every {} hours, batch size {}",
            config.archival.retention_days,
            config.archival.interval_hours,
            config.archival.batch_size
        );
        let task = ArchivalTask::new(storage.clone(), metrics.clone(), &config.archival)
            .context("Invalid archival configuration")?;
        Some(Arc::new(task))
    } else {
        info!("Archival is disabled");
        None
    };

    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());

    Ok(StartupContext {
        storage,
        metrics,
        archival,
    })
}
