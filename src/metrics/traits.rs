//! Prometheus-backed `MetricsRecorder`

pub use crate::metrics_core::{MetricsRecorder, NoopMetrics};

/// Wrapper that delegates to the global METRICS singleton.
///
/// This allows the global `Lazy<Metrics>` to be used with `Arc<dyn MetricsRecorder>`
/// since `Lazy<T>` doesn't implement `Clone`.
pub struct PrometheusMetricsWrapper;

impl MetricsRecorder for PrometheusMetricsWrapper {
    fn inc_clicks_logged(&self) {
        super::METRICS.clicks_logged_total.inc();
    }

    fn inc_archive_run(&self, status: &str) {
        super::METRICS
            .archive_runs_total
            .with_label_values(&[status])
            .inc();
    }

    fn add_archived_clicks(&self, count: u64) {
        super::METRICS.archived_clicks_total.inc_by(count as f64);
    }

    fn inc_active_connections(&self) {
        super::METRICS.http_active_connections.inc();
    }

    fn dec_active_connections(&self) {
        super::METRICS.http_active_connections.dec();
    }

    fn observe_http_request(&self, method: &str, endpoint: &str, status: &str, duration_secs: f64) {
        super::METRICS
            .http_request_duration_seconds
            .with_label_values(&[method, endpoint, status])
            .observe(duration_secs);
    }

    fn inc_http_request(&self, method: &str, endpoint: &str, status: &str) {
        super::METRICS
            .http_requests_total
            .with_label_values(&[method, endpoint, status])
            .inc();
    }

    fn set_db_connections(&self, count: f64) {
        super::METRICS.database_connections.set(count);
    }
}
