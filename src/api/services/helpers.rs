//! 响应构建帮助函数

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::{error, warn};

use crate::api::middleware::RequestId;
use crate::errors::AdMetricsError;

use super::types::ApiResponse;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Request successful";
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed unexpectedly";

/// 构建 JSON 信封响应
pub fn json_response<T: Serialize>(
    req: &HttpRequest,
    status: StatusCode,
    success: bool,
    message: &str,
    result: Option<T>,
) -> HttpResponse {
    let message = match (message.is_empty(), success) {
        (false, _) => message.to_string(),
        (true, true) => DEFAULT_SUCCESS_MESSAGE.to_string(),
        (true, false) => DEFAULT_ERROR_MESSAGE.to_string(),
    };

    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            success,
            trace_id: RequestId::of(req),
            message,
            result,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(
    req: &HttpRequest,
    status: StatusCode,
    message: &str,
    data: T,
) -> HttpResponse {
    json_response(req, status, true, message, Some(data))
}

/// 构建错误响应
pub fn error_response(req: &HttpRequest, status: StatusCode, message: &str) -> HttpResponse {
    json_response::<()>(req, status, false, message, None)
}

/// 从 AdMetricsError 构建错误响应（自动映射 HTTP 状态码）
pub fn error_from_admetrics(req: &HttpRequest, err: &AdMetricsError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("{} {} failed: {}", req.method(), req.path(), err.format_simple());
    } else {
        warn!("{} {} rejected: {}", req.method(), req.path(), err.format_simple());
    }
    error_response(req, status, err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(
    req: &HttpRequest,
    status: StatusCode,
    message: &str,
    result: Result<T, AdMetricsError>,
) -> HttpResponse {
    match result {
        Ok(data) => success_response(req, status, message, data),
        Err(e) => error_from_admetrics(req, &e),
    }
}

/// 传输层对端 IP（不含端口）
pub fn peer_ip(req: &HttpRequest) -> Option<String> {
    req.peer_addr().map(|addr| addr.ip().to_string())
}
