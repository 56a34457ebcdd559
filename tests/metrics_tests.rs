//! Metrics module tests
//!
//! These tests require the `metrics` feature to be enabled:
//!   cargo test --features metrics --test metrics_tests

#![cfg(feature = "metrics")]

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::App;

use admetrics::api::middleware::{RequestIdMiddleware, TimingMiddleware};
use admetrics::api::{AppStartTime, configure_app};
use admetrics::metrics::{METRICS, PrometheusMetricsWrapper};
use admetrics::metrics_core::{MetricsRecorder, default_recorder};
use admetrics::storage::MemoryStorage;

#[test]
fn test_wrapper_updates_registry() {
    let recorder = PrometheusMetricsWrapper;
    let before = METRICS.clicks_logged_total.get();
    recorder.inc_clicks_logged();
    assert_eq!(METRICS.clicks_logged_total.get(), before + 1.0);

    let archived = METRICS.archived_clicks_total.get();
    recorder.add_archived_clicks(5);
    assert_eq!(METRICS.archived_clicks_total.get(), archived + 5.0);

    recorder.set_db_connections(3.0);
    assert_eq!(METRICS.database_connections.get(), 3.0);
}

#[test]
fn test_archive_run_labels() {
    let recorder = default_recorder();
    recorder.inc_archive_run("failure");
    let output = METRICS.export();
    assert!(output.contains("archive_runs_total{status=\"failure\"}"));
}

#[actix_web::test]
async fn test_metrics_endpoint_exports_http_series() {
    let metrics: Arc<dyn MetricsRecorder> = Arc::new(PrometheusMetricsWrapper);
    let app = test::init_service(
        App::new()
            .wrap(TimingMiddleware::new(metrics.clone()))
            .wrap(RequestIdMiddleware)
            .configure(configure_app(
                Arc::new(MemoryStorage::new()),
                metrics,
                AppStartTime::now(),
            )),
    )
    .await;

    let req = TestRequest::get().uri("/api/analytics").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("path=\"analytics\""));
}
