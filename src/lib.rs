//! admetrics - video ad click tracking and engagement analytics
//!
//! Every click write atomically maintains a per-ad running aggregate, a
//! background task moves old clicks from the hot partition to the cold one,
//! and windowed analytics always read both partitions.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//! - **metrics**: Prometheus metrics export
//! - **full**: All features enabled
//!
//! # Architecture
//! - `storage`: `AdRepository` and its sea-orm / in-memory backends
//! - `services`: ad registry, click ingestion and analytics
//! - `archive`: hot → cold archival task
//! - `api`: HTTP services and middleware
//! - `interfaces`: CLI commands
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod api;
pub mod archive;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod metrics_core;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
