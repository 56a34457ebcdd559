//! Core metrics traits (always compiled, no feature gate).
//!
//! Provides `MetricsRecorder` trait and `NoopMetrics` so that all modules
//! can accept `Arc<dyn MetricsRecorder>` unconditionally.  When the
//! `metrics` feature is disabled, `NoopMetrics` is injected and the
//! compiler optimises every call to a no-op.

use std::sync::Arc;

/// Trait for recording application metrics.
///
/// All methods are no-op by default, allowing partial implementation.
/// Implementations must be thread-safe (Send + Sync).
#[allow(unused_variables)]
pub trait MetricsRecorder: Send + Sync {
    // ===== Ingestion =====

    /// Record a committed click
    fn inc_clicks_logged(&self) {}

    // ===== Archival =====

    /// Record an archival run outcome ("success" / "failure")
    fn inc_archive_run(&self, status: &str) {}

    /// Add rows moved from hot to cold storage
    fn add_archived_clicks(&self, count: u64) {}

    // ===== HTTP (timing middleware) =====

    /// Increment active connections counter
    fn inc_active_connections(&self) {}

    /// Decrement active connections counter
    fn dec_active_connections(&self) {}

    /// Observe HTTP request duration
    fn observe_http_request(&self, method: &str, endpoint: &str, status: &str, duration_secs: f64) {
    }

    /// Record HTTP request
    fn inc_http_request(&self, method: &str, endpoint: &str, status: &str) {}

    // ===== Database =====

    /// Set the number of pool connections currently in use
    fn set_db_connections(&self, count: f64) {}
}

/// Noop metrics implementation for testing and non-metrics builds.
///
/// All methods do nothing, allowing code to run without Prometheus dependencies.
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {}

impl NoopMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<dyn MetricsRecorder> {
        Arc::new(Self::new())
    }
}

impl Default for NoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the recorder for the current build: Prometheus when the `metrics`
/// feature is on, otherwise `NoopMetrics`.
pub fn default_recorder() -> Arc<dyn MetricsRecorder> {
    #[cfg(feature = "metrics")]
    {
        Arc::new(crate::metrics::PrometheusMetricsWrapper)
    }
    #[cfg(not(feature = "metrics"))]
    {
        NoopMetrics::arc()
    }
}
