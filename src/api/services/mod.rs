mod ads;
mod analytics;
mod clicks;
mod health;
pub mod helpers;
mod metrics;
pub mod types;

use std::sync::Arc;

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::web;

use crate::metrics_core::MetricsRecorder;
use crate::services::{AdService, AnalyticsService, ClickService};
use crate::storage::AdRepository;

pub use health::{AppStartTime, HealthService};
pub use metrics::MetricsService;

/// 请求体无法解析时的统一 400 响应
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, req| {
            let response =
                helpers::error_response(req, StatusCode::BAD_REQUEST, "Invalid request payload");
            InternalError::from_response(err, response).into()
        })
}

/// 查询串无法解析时的统一 400 响应
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        let response =
            helpers::error_response(req, StatusCode::BAD_REQUEST, "Invalid query parameters");
        InternalError::from_response(err, response).into()
    })
}

/// 注册路由
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(HealthService::health_check))
        .route("/metrics", web::get().to(MetricsService::metrics))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/ads")
                        .route(web::get().to(ads::list_ads))
                        .route(web::post().to(ads::create_ad)),
                )
                .route("/ads/{id}", web::get().to(ads::get_ad))
                .route("/ads/{id}/monthly", web::get().to(ads::list_monthly))
                .route("/clicks", web::post().to(clicks::log_click))
                .route("/analytics", web::get().to(analytics::get_ads_analytics))
                .route("/analytics/{id}", web::get().to(analytics::get_ad_analytics)),
        );
}

/// 组装服务依赖并注册路由，每个 worker 调用一次
pub fn configure_app(
    storage: Arc<dyn AdRepository>,
    metrics: Arc<dyn MetricsRecorder>,
    start_time: AppStartTime,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(AdService::new(storage.clone())))
            .app_data(web::Data::new(ClickService::new(
                storage.clone(),
                metrics.clone(),
            )))
            .app_data(web::Data::new(AnalyticsService::new(storage.clone())))
            .app_data(web::Data::new(storage))
            .app_data(web::Data::new(metrics))
            .app_data(web::Data::new(start_time));
        routes(cfg);
    }
}
