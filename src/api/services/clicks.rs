use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};

use crate::services::{ClickService, LogClickRequest};

use super::helpers::{api_result, peer_ip};

pub async fn log_click(
    req: HttpRequest,
    service: web::Data<ClickService>,
    payload: web::Json<LogClickRequest>,
) -> HttpResponse {
    let result = service
        .log_click(payload.into_inner(), peer_ip(&req))
        .await;
    api_result(&req, StatusCode::CREATED, "Click logged successfully", result)
}
