//! Prometheus metrics module
//!
//! Provides metrics collection and export for monitoring.
//!
//! # Feature
//! This module requires the `metrics` feature to be enabled.

mod registry;
mod traits;

pub use registry::METRICS;
pub use traits::{MetricsRecorder, NoopMetrics, PrometheusMetricsWrapper};
