//! Service layer for business logic
//!
//! This module provides unified business logic that can be shared between
//! different interfaces (HTTP API, CLI).

mod ad_service;
mod analytics_service;
mod click_service;

pub use ad_service::*;
pub use analytics_service::*;
pub use click_service::*;
