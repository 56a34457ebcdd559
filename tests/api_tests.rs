//! HTTP API integration tests
//!
//! Drives the full route table (envelope, status mapping, request id) over an
//! in-memory storage.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, body::MessageBody, dev::ServiceResponse};
use serde_json::{Value, json};
use uuid::Uuid;

use admetrics::api::middleware::{RequestIdMiddleware, TimingMiddleware};
use admetrics::api::{AppStartTime, configure_app};
use admetrics::metrics_core::NoopMetrics;
use admetrics::storage::{AdRepository, MemoryStorage};

// =============================================================================
// Test Setup
// =============================================================================

macro_rules! test_app {
    ($storage:expr) => {
        test::init_service(
            App::new()
                .wrap(TimingMiddleware::new(NoopMetrics::arc()))
                .wrap(RequestIdMiddleware)
                .configure(configure_app(
                    $storage,
                    NoopMetrics::arc(),
                    AppStartTime::now(),
                )),
        )
        .await
    };
}

fn new_storage() -> Arc<dyn AdRepository> {
    Arc::new(MemoryStorage::new())
}

async fn read_json<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).expect("response body should be JSON")
}

fn ad_payload(name: &str) -> Value {
    json!({
        "name": name,
        "description": "spring campaign",
        "image_url": "https://cdn.example.com/spring.png",
        "target_url": "https://example.com/spring"
    })
}

// =============================================================================
// Ads
// =============================================================================

#[actix_web::test]
async fn test_create_and_fetch_ad() {
    let app = test_app!(new_storage());

    let req = TestRequest::post()
        .uri("/api/ads")
        .set_json(ad_payload("Spring"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = read_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Ad created successfully");
    assert_eq!(body["result"]["name"], "Spring");
    let id = body["result"]["id"].as_str().unwrap().to_string();

    let req = TestRequest::get().uri(&format!("/api/ads/{}", id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["message"], "Request successful");
    assert_eq!(body["result"]["target_url"], "https://example.com/spring");
}

#[actix_web::test]
async fn test_ad_lookup_errors() {
    let app = test_app!(new_storage());

    let req = TestRequest::get().uri("/api/ads/not-a-uuid").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid ad ID");
    assert!(body.get("result").is_none());

    let req = TestRequest::get()
        .uri(&format!("/api/ads/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_ad_rejects_bad_payload() {
    let app = test_app!(new_storage());

    let req = TestRequest::post()
        .uri("/api/ads")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert_eq!(body["message"], "Invalid request payload");

    let mut payload = ad_payload("bad");
    payload["target_url"] = json!("javascript:alert(1)");
    let req = TestRequest::post()
        .uri("/api/ads")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_list_ads_pagination() {
    let app = test_app!(new_storage());
    for name in ["one", "two", "three"] {
        let req = TestRequest::post()
            .uri("/api/ads")
            .set_json(ad_payload(name))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let req = TestRequest::get()
        .uri("/api/ads?page=1&rows=2&order=asc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["result"]["values"].as_array().unwrap().len(), 2);
    assert_eq!(body["result"]["pages"]["total_count"], 3);
    assert_eq!(body["result"]["pages"]["total_pages"], 2);

    let req = TestRequest::get().uri("/api/ads?rows=0").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert_eq!(body["message"], "invalid value for query param `rows` provided");
}

// =============================================================================
// Clicks & analytics
// =============================================================================

#[actix_web::test]
async fn test_click_then_analytics() {
    let storage = new_storage();
    let app = test_app!(storage.clone());

    let req = TestRequest::post()
        .uri("/api/ads")
        .set_json(ad_payload("tracked"))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    let id = body["result"]["id"].as_str().unwrap().to_string();

    for playback in [10, 20, 30] {
        let req = TestRequest::post()
            .uri("/api/clicks")
            .peer_addr("192.0.2.10:51000".parse().unwrap())
            .set_json(json!({ "ad_id": id, "playback_time": playback }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        assert_eq!(body["message"], "Click logged successfully");
        assert_eq!(body["result"]["ip_address"], "192.0.2.10");
    }

    let req = TestRequest::get()
        .uri(&format!("/api/analytics/{}?period=day", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    let result = &body["result"];
    assert_eq!(result["total_clicks"], 3);
    assert_eq!(result["total_playback_time"], 60);
    assert_eq!(result["average_playback_time"], 20.0);
    assert_eq!(result["period"], "day");
    assert_eq!(result["total_clicks_in_range"], 3);
    assert_eq!(result["total_playback_time_in_range"], 60);

    let req = TestRequest::get().uri("/api/analytics").to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["result"]["period"], "hour");
    assert_eq!(body["result"]["average_clicks_per_ad"], 3.0);
}

#[actix_web::test]
async fn test_click_errors() {
    let app = test_app!(new_storage());

    let req = TestRequest::post()
        .uri("/api/clicks")
        .set_json(json!({ "ad_id": Uuid::new_v4().to_string(), "playback_time": 4 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::post()
        .uri("/api/clicks")
        .set_json(json!({ "ad_id": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/clicks")
        .set_json(json!({ "ad_id": Uuid::new_v4().to_string(), "playback_time": -1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_invalid_period() {
    let app = test_app!(new_storage());

    let req = TestRequest::get()
        .uri("/api/analytics?period=decade")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert_eq!(body["message"], "Invalid period");
}

#[actix_web::test]
async fn test_monthly_listing_for_missing_ad() {
    let app = test_app!(new_storage());

    let req = TestRequest::get()
        .uri(&format!("/api/ads/{}/monthly", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Request id & health
// =============================================================================

#[actix_web::test]
async fn test_request_id_header_matches_trace_id() {
    let app = test_app!(new_storage());

    let req = TestRequest::get().uri("/api/analytics").to_request();
    let resp = test::call_service(&app, req).await;
    let header = resp
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap()
        .to_string();
    let body = read_json(resp).await;
    assert_eq!(body["trace_id"], header.as_str());
    assert!(Uuid::parse_str(&header).is_ok());
}

#[actix_web::test]
async fn test_incoming_request_id_is_reused() {
    let app = test_app!(new_storage());

    let req = TestRequest::get()
        .uri("/api/analytics")
        .insert_header(("X-Request-ID", "edge-7f3a"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "edge-7f3a");
    let body = read_json(resp).await;
    assert_eq!(body["trace_id"], "edge-7f3a");
}

#[actix_web::test]
async fn test_health_reports_backend() {
    let app = test_app!(new_storage());

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["status"], "healthy");
    assert_eq!(body["result"]["backend"], "memory");
}
