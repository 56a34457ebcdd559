use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::services::AnalyticsService;

use super::helpers::api_result;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

pub async fn get_ads_analytics(
    req: HttpRequest,
    service: web::Data<AnalyticsService>,
    query: web::Query<PeriodQuery>,
) -> HttpResponse {
    let result = service.get_ads_analytics(query.period.as_deref()).await;
    api_result(&req, StatusCode::OK, "", result)
}

pub async fn get_ad_analytics(
    req: HttpRequest,
    service: web::Data<AnalyticsService>,
    path: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> HttpResponse {
    let result = service
        .get_ad_analytics(&path, query.period.as_deref())
        .await;
    api_result(&req, StatusCode::OK, "", result)
}
