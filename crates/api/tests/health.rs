//! Integration tests for health endpoints and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = common::build_test_app().await;
    let response = get(app.router(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app().await;
    let response = get(app.router(), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app().await;
    let response = get(app.router(), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36, "x-request-id should be a UUID string");
}

#[tokio::test]
async fn cors_preflight_returns_correct_headers() {
    let app = common::build_test_app().await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/search")
        .header("Origin", common::ORIGIN)
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap().to_str().unwrap(),
        common::ORIGIN
    );
    let allow_methods = headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(allow_methods.contains("GET"), "got: {allow_methods}");
}

// ---------------------------------------------------------------------------
// Configuration health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn system_health_is_degraded_without_schemas() {
    let app = common::build_test_app().await;
    let response = get(app.router(), "/api/system/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["overall_status"], "degraded");
    assert_eq!(json["checks"]["categories_config"]["status"], "ok");
    assert_eq!(json["checks"]["schemas_directory"]["status"], "warning");
    assert_eq!(json["issues"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn system_health_is_healthy_with_schemas_dir() {
    let app = common::build_test_app().await;
    std::fs::create_dir_all(app.path("config/schemas")).unwrap();

    let json = body_json(get(app.router(), "/api/system/health").await).await;
    assert_eq!(json["overall_status"], "healthy");
    assert!(json["issues"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_document_makes_system_unhealthy() {
    let app = common::build_test_app().await;
    std::fs::write(app.path("config/ui.json"), "{ not json").unwrap();

    let response = get(app.router(), "/api/system/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["overall_status"], "unhealthy");
    assert_eq!(json["checks"]["ui_config"]["status"], "error");
}
