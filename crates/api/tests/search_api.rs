//! Integration tests for the search page, `/search` and data reloads.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, get, post_empty};
use serde_json::{json, Value};

fn names(json: &Value) -> Vec<&str> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// GET /search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_query_returns_empty_array() {
    let app = common::build_test_app().await;

    for uri in ["/search", "/search?q=", "/search?q=&category=weapon"] {
        let response = get(app.router(), uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn keyword_search_returns_flat_records() {
    let app = common::build_test_app().await;
    let json = body_json(get(app.router(), "/search?q=Sword").await).await;

    assert_eq!(
        json,
        json!([{
            "id": 1,
            "name": "Weapon Sword",
            "description": "A sharp blade",
            "rarity": "rare"
        }])
    );
}

#[tokio::test]
async fn lowercase_query_is_answered_by_full_text_fallback() {
    let app = common::build_test_app().await;
    let json = body_json(get(app.router(), "/search?q=sword").await).await;

    assert_eq!(names(&json), vec!["Weapon Sword"]);
}

#[tokio::test]
async fn category_filter_selects_by_display_name() {
    let app = common::build_test_app().await;
    let json = body_json(get(app.router(), "/search?q=Weapon&category=weapon").await).await;

    assert_eq!(names(&json), vec!["Weapon Sword", "Weapon Axe"]);
}

#[tokio::test]
async fn fields_parameter_narrows_results() {
    let app = common::build_test_app().await;

    let json = body_json(get(app.router(), "/search?q=A&fields=description").await).await;
    assert_eq!(names(&json), vec!["Weapon Sword", "Shield Buckler"]);

    let json = body_json(get(app.router(), "/search?q=Weapon&fields=rarity").await).await;
    assert_eq!(json, json!([]));

    let json = body_json(get(app.router(), "/search?q=Sword&fields=%20name%20,").await).await;
    assert_eq!(names(&json), vec!["Weapon Sword"]);
}

#[tokio::test]
async fn unmatched_query_returns_empty_array() {
    let app = common::build_test_app().await;
    let json = body_json(get(app.router(), "/search?q=Nothing").await).await;
    assert_eq!(json, json!([]));
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_page_shows_title_and_counts() {
    let app = common::build_test_app().await;
    let response = get(app.router(), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let html = body_text(response).await;
    assert!(html.contains("<title>Item Search</title>"));
    assert!(html.contains("data-category=\"weapon\""));
    assert!(html.contains("<span class=\"count\">2</span>"));
    assert!(html.contains("<span class=\"count\">1</span>"));
}

#[tokio::test]
async fn index_page_reads_configuration_on_first_request() {
    let app = common::build_test_app().await;
    let ui = json!({ "ui": { "title": "Armory", "subtitle": "Find gear" } });
    std::fs::write(app.path("config/ui.json"), ui.to_string()).unwrap();
    app.state.config_manager.clear_cache();

    let html = body_text(get(app.router(), "/").await).await;
    assert!(html.contains("<title>Armory</title>"));
    assert!(html.contains("data-category=\"shield\""));
}

// ---------------------------------------------------------------------------
// Category counts and reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn category_counts_are_enveloped() {
    let app = common::build_test_app().await;
    let json = body_json(get(app.router(), "/api/categories/counts").await).await;

    assert_eq!(
        json["data"],
        json!([
            {"key": "weapon", "display_name": "Weapon", "count": 2, "configured": true},
            {"key": "shield", "display_name": "Shield", "count": 1, "configured": true}
        ])
    );
}

#[tokio::test]
async fn reload_rebuilds_store_from_csv() {
    let app = common::build_test_app().await;
    std::fs::write(
        app.path("data/items.csv"),
        format!("{}weapon,Dagger,Short blade,common\n", common::ITEMS_CSV),
    )
    .unwrap();

    let response = post_empty(app.router(), "/api/data/reload").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["stored"], true);
    assert_eq!(json["data"]["inserted"], 4);
    assert_eq!(json["data"]["result"]["is_valid"], true);

    let json = body_json(get(app.router(), "/search?q=Dagger").await).await;
    assert_eq!(names(&json), vec!["Weapon Dagger"]);
}

#[tokio::test]
async fn reload_picks_up_renamed_display_name() {
    let app = common::build_test_app().await;
    let categories = json!({
        "categories": {
            "weapon": {
                "display_name": "Arms",
                "icon": "fas fa-sword",
                "emoji_fallback": "⚔️",
                "color": "#e74c3c"
            }
        }
    });
    std::fs::write(app.path("config/categories.json"), categories.to_string()).unwrap();

    post_empty(app.router(), "/api/data/reload").await;

    let json = body_json(get(app.router(), "/search?q=Arms&category=weapon").await).await;
    assert_eq!(names(&json), vec!["Arms Sword", "Arms Axe"]);
}

#[tokio::test]
async fn strict_reload_keeps_store_when_batch_is_invalid() {
    let app = common::build_test_app_with(|c| c.strict_validation = true).await;
    std::fs::write(
        app.path("data/items.csv"),
        "category,name,description,rarity\nweapon,,No name,rare\n",
    )
    .unwrap();

    let json = body_json(post_empty(app.router(), "/api/data/reload").await).await;
    assert_eq!(json["data"]["stored"], false);
    assert_eq!(json["data"]["result"]["is_valid"], false);

    let json = body_json(get(app.router(), "/search?q=Sword").await).await;
    assert_eq!(names(&json), vec!["Weapon Sword"]);
}
