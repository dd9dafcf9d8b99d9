//! Integration tests for the `/api/backups` endpoints.

mod common;

use std::path::PathBuf;

use axum::http::StatusCode;
use common::{body_json, get, post_empty, post_json};
use serde_json::json;

#[tokio::test]
async fn created_backup_is_listed_and_counted() {
    let app = common::build_test_app().await;
    let csv = app.path("data/items.csv");

    let response = post_json(
        app.router(),
        "/api/backups",
        json!({ "source_path": csv, "backup_type": "data", "description": "manual" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let backup_path = PathBuf::from(
        body_json(response).await["data"]["backup_path"]
            .as_str()
            .unwrap(),
    );
    assert!(backup_path.is_file());
    assert_eq!(std::fs::read_to_string(&backup_path).unwrap(), common::ITEMS_CSV);

    let list = body_json(get(app.router(), "/api/backups").await).await;
    let entries = list["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["backup_type"], "data");
    assert_eq!(entries[0]["file_type"], "file");
    assert_eq!(entries[0]["description"], "manual");
    assert!(entries[0]["checksum"].is_string());

    let stats = body_json(get(app.router(), "/api/backups/stats").await).await;
    assert_eq!(stats["data"]["total_backups"], 1);
    assert_eq!(stats["data"]["backup_types"]["data"], 1);
}

#[tokio::test]
async fn config_directory_backup_has_no_checksum() {
    let app = common::build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/backups",
        json!({ "source_path": app.path("config"), "backup_type": "config" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let list = body_json(get(app.router(), "/api/backups").await).await;
    assert_eq!(list["data"][0]["file_type"], "directory");
    assert!(list["data"][0]["checksum"].is_null());
}

#[tokio::test]
async fn invalid_backup_type_is_400() {
    let app = common::build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/backups",
        json!({ "source_path": app.path("data/items.csv"), "backup_type": "weekly" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn source_outside_allowed_roots_is_rejected() {
    let app = common::build_test_app().await;
    let elsewhere = tempfile::tempdir().unwrap();
    let secret = elsewhere.path().join("secret.txt");
    std::fs::write(&secret, "x").unwrap();

    let response = post_json(
        app.router(),
        "/api/backups",
        json!({ "source_path": secret, "backup_type": "data" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn missing_source_is_404() {
    let app = common::build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/backups",
        json!({ "source_path": app.path("data/absent.csv"), "backup_type": "data" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cleanup_keeps_fresh_backups() {
    let app = common::build_test_app().await;
    post_json(
        app.router(),
        "/api/backups",
        json!({ "source_path": app.path("data/items.csv"), "backup_type": "data" }),
    )
    .await;

    let response = post_empty(app.router(), "/api/backups/cleanup").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["files_removed"], 0);
    assert_eq!(json["data"]["errors"], json!([]));

    let list = body_json(get(app.router(), "/api/backups").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reload_backs_up_the_csv_first_when_enabled() {
    let app = common::build_test_app_with(|c| c.backup_before_load = true).await;

    let json = body_json(post_empty(app.router(), "/api/data/reload").await).await;
    assert!(json["data"]["backup_path"].is_string());

    let list = body_json(get(app.router(), "/api/backups").await).await;
    let entries = list["data"].as_array().unwrap();
    // One from the initial load, one from the reload.
    assert_eq!(entries.len(), 2);
    assert!(entries
        .iter()
        .all(|e| e["description"].as_str().unwrap().starts_with("Pre-update backup")));
}
