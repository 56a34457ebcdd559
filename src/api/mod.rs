//! HTTP surface
//!
//! 只做参数提取与响应封装，业务判断全部在 `services` 层。

pub mod middleware;
pub mod services;

pub use services::{AppStartTime, configure_app};
