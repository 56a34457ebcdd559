use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};

use crate::services::{AdService, AnalyticsService, CreateAdRequest, ListAdsParams};

use super::helpers::api_result;
use super::types::AdListResult;

pub async fn list_ads(
    req: HttpRequest,
    service: web::Data<AdService>,
    query: web::Query<ListAdsParams>,
) -> HttpResponse {
    let result = service
        .list_ads(query.into_inner())
        .await
        .map(AdListResult::from);
    api_result(&req, StatusCode::OK, "", result)
}

pub async fn create_ad(
    req: HttpRequest,
    service: web::Data<AdService>,
    payload: web::Json<CreateAdRequest>,
) -> HttpResponse {
    let result = service.create_ad(payload.into_inner()).await;
    api_result(&req, StatusCode::CREATED, "Ad created successfully", result)
}

pub async fn get_ad(
    req: HttpRequest,
    service: web::Data<AdService>,
    path: web::Path<String>,
) -> HttpResponse {
    let result = service.get_ad(&path).await;
    api_result(&req, StatusCode::OK, "", result)
}

pub async fn list_monthly(
    req: HttpRequest,
    service: web::Data<AnalyticsService>,
    path: web::Path<String>,
) -> HttpResponse {
    let result = service.list_monthly(&path).await;
    api_result(&req, StatusCode::OK, "", result)
}
