use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, trace};

use crate::metrics_core::MetricsRecorder;
use crate::storage::AdRepository;

use super::helpers::json_response;
use super::types::HealthResponse;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

/// 存储探活超时
const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Health Service
///
/// 直接探测存储，不经过业务服务层。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        req: HttpRequest,
        storage: web::Data<Arc<dyn AdRepository>>,
        metrics: web::Data<Arc<dyn MetricsRecorder>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> HttpResponse {
        let start_time = Instant::now();
        trace!("Received health check request");

        let check = match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                Err(format!("database error: {}", e.message()))
            }
            Err(_) => {
                error!("Storage health check timeout");
                Err("timeout".to_string())
            }
        };

        crate::runtime::lifetime::pool_metrics::record_pool_stats(
            storage.get_ref().as_ref(),
            metrics.get_ref().as_ref(),
        );

        let now = chrono::Utc::now();
        let uptime = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = check.is_ok();

        let health = HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            backend: storage.backend_name().to_string(),
            timestamp: now.to_rfc3339(),
            uptime,
            response_time_ms: start_time.elapsed().as_millis() as u64,
            error: check.err(),
        };

        if is_healthy {
            json_response(&req, StatusCode::OK, true, "", Some(health))
        } else {
            json_response(
                &req,
                StatusCode::SERVICE_UNAVAILABLE,
                false,
                "Storage unavailable",
                Some(health),
            )
        }
    }
}
