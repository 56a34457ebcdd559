//! Server mode
//!
//! Starts the HTTP server and the background archival task. On SIGINT or
//! SIGTERM the server is stopped first, then the archival task is signalled
//! and awaited.

use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Compress};
use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::middleware::{RequestIdMiddleware, TimingMiddleware};
use crate::api::{AppStartTime, configure_app};
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let storage = startup.storage.clone();
    let metrics = startup.metrics.clone();

    let config = crate::config::get_config();
    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    // 归档任务只在两次运行之间检查该信号
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let archival_handle = startup.archival.clone().map(|task| {
        task.spawn(
            Duration::from_secs(config.archival.interval_hours.saturating_mul(3600)),
            Duration::from_secs(config.archival.initial_delay_secs),
            shutdown_rx.clone(),
        )
    });
    lifetime::pool_metrics::spawn_pool_metrics_updater(
        storage.clone(),
        metrics.clone(),
        shutdown_rx.clone(),
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware::new(metrics.clone())) // 最外层，记录请求延迟
            .wrap(RequestIdMiddleware) // 为每个请求生成 request_id
            .wrap(Compress::default())
            .configure(configure_app(
                storage.clone(),
                metrics.clone(),
                app_start_time.clone(),
            ))
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    // 信号由 wait_for_signal 接管
    let server = server.bind(bind_address)?.disable_signals().run();
    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    let server_result = tokio::select! {
        res = &mut server_task => {
            warn!("HTTP server exited");
            res
        }
        _ = lifetime::shutdown::wait_for_signal() => {
            info!("Stopping HTTP server...");
            server_handle.stop(true).await;
            server_task.await
        }
    };

    lifetime::shutdown::shutdown_background_tasks(shutdown_tx, archival_handle).await;
    server_result.context("HTTP server task panicked")??;
    warn!("Graceful shutdown: all tasks completed");

    Ok(())
}
