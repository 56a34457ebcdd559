//! Global metrics registry
//!
//! Defines all Prometheus metrics used in the application.

use once_cell::sync::Lazy;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

/// Global metrics instance
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Application metrics container
pub struct Metrics {
    /// Internal Prometheus registry
    registry: Registry,

    // ===== HTTP metrics =====
    /// Total HTTP requests by method, path and status
    pub http_requests_total: CounterVec,
    /// HTTP request duration by method, path and status
    pub http_request_duration_seconds: HistogramVec,
    /// Requests currently in flight
    pub http_active_connections: Gauge,

    // ===== Ingestion metrics =====
    /// Clicks committed
    pub clicks_logged_total: Counter,

    // ===== Archival metrics =====
    /// Archival runs by status
    pub archive_runs_total: CounterVec,
    /// Rows moved to cold storage
    pub archived_clicks_total: Counter,

    // ===== Database metrics =====
    /// Connections held by the pool
    pub database_connections: Gauge,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path", "status"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        let http_active_connections = Gauge::new(
            "http_active_connections",
            "Number of HTTP requests currently being served",
        )
        .expect("Failed to create http_active_connections metric");

        let clicks_logged_total =
            Counter::new("clicks_logged_total", "Total number of clicks logged")
                .expect("Failed to create clicks_logged_total metric");

        let archive_runs_total = CounterVec::new(
            Opts::new("archive_runs_total", "Archival runs by status"),
            &["status"],
        )
        .expect("Failed to create archive_runs_total metric");

        let archived_clicks_total = Counter::new(
            "archived_clicks_total",
            "Total number of clicks moved to cold storage",
        )
        .expect("Failed to create archived_clicks_total metric");

        let database_connections = Gauge::new(
            "database_connections",
            "Number of database connections currently in use",
        )
        .expect("Failed to create database_connections metric");

        // Register all metrics
        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("Failed to register http_request_duration_seconds");
        registry
            .register(Box::new(http_active_connections.clone()))
            .expect("Failed to register http_active_connections");
        registry
            .register(Box::new(clicks_logged_total.clone()))
            .expect("Failed to register clicks_logged_total");
        registry
            .register(Box::new(archive_runs_total.clone()))
            .expect("Failed to register archive_runs_total");
        registry
            .register(Box::new(archived_clicks_total.clone()))
            .expect("Failed to register archived_clicks_total");
        registry
            .register(Box::new(database_connections.clone()))
            .expect("Failed to register database_connections");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_active_connections,
            clicks_logged_total,
            archive_runs_total,
            archived_clicks_total,
            database_connections,
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_registered_names() {
        METRICS.clicks_logged_total.inc();
        METRICS.archive_runs_total.with_label_values(&["success"]).inc();
        let output = METRICS.export();
        assert!(output.contains("clicks_logged_total"));
        assert!(output.contains("archive_runs_total"));
    }
}
