use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C 或 SIGTERM
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}

/// 通知并等待后台任务结束
///
/// 无论 HTTP 服务器因信号还是自身错误退出，都必须调用。
pub async fn shutdown_background_tasks(
    shutdown_tx: watch::Sender<bool>,
    archival_handle: Option<JoinHandle<()>>,
) {
    info!("Stopping background tasks...");

    let shutdown_result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(shutdown_tx, archival_handle),
    )
    .await;

    match shutdown_result {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                SHUTDOWN_TIMEOUT_SECS
            );
            std::process::exit(1);
        }
    }
}

/// 执行所有关闭任务（在超时内调用）
async fn perform_shutdown_tasks(
    shutdown_tx: watch::Sender<bool>,
    archival_handle: Option<JoinHandle<()>>,
) {
    // 接收端全部退出时 send 会失败，可以忽略
    let _ = shutdown_tx.send(true);

    let Some(handle) = archival_handle else {
        info!("Archival task is not running, skipping");
        return;
    };

    // 正在进行的归档事务会完整提交或回滚
    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), handle).await {
        Ok(Ok(())) => {
            info!("Archival task stopped cleanly");
        }
        Ok(Err(e)) => {
            error!("Archival task panicked during shutdown: {}", e);
        }
        Err(_) => {
            error!(
                "Archival task did not stop within {} seconds",
                TASK_TIMEOUT_SECS
            );
        }
    }
}
