//! HTTP timing middleware
//!
//! Records HTTP request duration, request count, and active connections
//! through the injected `MetricsRecorder`.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics_core::MetricsRecorder;

/// Drop guard that decrements active connections when dropped.
/// Ensures `dec()` runs even if the future panics.
struct ActiveConnectionGuard(Arc<dyn MetricsRecorder>);

impl Drop for ActiveConnectionGuard {
    fn drop(&mut self) {
        self.0.dec_active_connections();
    }
}

/// HTTP timing middleware factory
#[derive(Clone)]
pub struct TimingMiddleware {
    metrics: Arc<dyn MetricsRecorder>,
}

impl TimingMiddleware {
    pub fn new(metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { metrics }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TimingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TimingService {
            service: Rc::new(service),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct TimingService<S> {
    service: Rc<S>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<S, B> Service<ServiceRequest> for TimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let metrics = self.metrics.clone();
        let start = Instant::now();

        // Extract method and endpoint for labels (avoid String allocation)
        let method = method_str(req.method());
        let endpoint = classify_endpoint(req.path());

        Box::pin(async move {
            // Guard ensures dec() runs even on panic
            metrics.inc_active_connections();
            let _guard = ActiveConnectionGuard(metrics.clone());

            let result = srv.call(req).await;

            let duration = start.elapsed().as_secs_f64();
            let status = match &result {
                Ok(response) => status_str(response.status()),
                Err(_) => "500",
            };

            metrics.observe_http_request(method, endpoint, status, duration);
            metrics.inc_http_request(method, endpoint, status);

            result
        })
    }
}

/// Map HTTP method to a static string (avoids allocation).
fn method_str(method: &actix_web::http::Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        _ => "OTHER",
    }
}

/// Map HTTP status code to a static string (avoids allocation for common codes).
fn status_str(status: actix_web::http::StatusCode) -> &'static str {
    match status.as_u16() {
        200 => "200",
        201 => "201",
        400 => "400",
        404 => "404",
        405 => "405",
        500 => "500",
        503 => "503",
        _ => "other",
    }
}

/// Classify request path into endpoint category
///
/// This prevents label cardinality explosion: ad ids never become labels.
fn classify_endpoint(path: &str) -> &'static str {
    if path.starts_with("/api/ads") {
        "ads"
    } else if path.starts_with("/api/clicks") {
        "clicks"
    } else if path.starts_with("/api/analytics") {
        "analytics"
    } else if path.starts_with("/health") {
        "health"
    } else if path.starts_with("/metrics") {
        "metrics"
    } else {
        "other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_endpoint_groups_ids() {
        assert_eq!(
            classify_endpoint("/api/analytics/0b8e6a3c-5b0d-4c57-9d56-2f1f4d5a9f10"),
            "analytics"
        );
        assert_eq!(classify_endpoint("/api/ads/x/monthly"), "ads");
        assert_eq!(classify_endpoint("/api/clicks"), "clicks");
        assert_eq!(classify_endpoint("/favicon.ico"), "other");
    }

    #[test]
    fn test_status_str() {
        use actix_web::http::StatusCode;
        assert_eq!(status_str(StatusCode::CREATED), "201");
        assert_eq!(status_str(StatusCode::IM_A_TEAPOT), "other");
    }
}
