#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use isdb_api::config::ServerConfig;
use isdb_api::handlers::data::reload_store;
use isdb_api::router::build_app_router;
use isdb_api::state::AppState;
use isdb_core::backup::BackupManager;
use isdb_core::config::ConfigManager;

pub const ITEMS_CSV: &str = "category,name,description,rarity\n\
weapon,Sword,A sharp blade,rare\n\
weapon,Axe,Chops wood,common\n\
shield,Buckler,A small round shield,common\n";

pub const ORIGIN: &str = "http://localhost:5000";

/// A server workspace in a temp directory.
///
/// Layout: `config/` (categories, fields, one example), `data/items.csv`,
/// `data/test.db`, `backups/`.
pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }

    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }
}

/// Build a test `ServerConfig` rooted at `root`.
pub fn test_config(root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![ORIGIN.to_string()],
        request_timeout_secs: 30,
        database_url: format!("sqlite://{}", root.join("data/test.db").display()),
        config_dir: root.join("config"),
        csv_path: root.join("data/items.csv"),
        validation_schema_path: root.join("data/validation.json"),
        backup_dir: root.join("backups"),
        strict_validation: false,
        backup_before_load: false,
    }
}

fn write_config(dir: &Path) {
    fs::create_dir_all(dir.join("examples")).unwrap();
    let categories = json!({
        "categories": {
            "weapon": {
                "display_name": "Weapon",
                "icon": "fas fa-sword",
                "emoji_fallback": "⚔️",
                "color": "#e74c3c"
            },
            "shield": {
                "display_name": "Shield",
                "icon": "fas fa-shield",
                "emoji_fallback": "🛡️",
                "color": "#3498db"
            }
        }
    });
    let fields = json!({
        "field_mappings": {
            "category": "category",
            "name": "name",
            "description": "description",
            "rarity": "rarity"
        },
        "required_fields": ["category", "name"]
    });
    let ui = json!({ "ui": { "title": "Item Search", "subtitle": "Find gear" } });
    let example = json!({
        "title": "RPG items",
        "description": "Weapons and shields",
        "categories": {}
    });

    fs::write(dir.join("categories.json"), categories.to_string()).unwrap();
    fs::write(dir.join("fields.json"), fields.to_string()).unwrap();
    fs::write(dir.join("ui.json"), ui.to_string()).unwrap();
    fs::write(dir.join("examples/rpg_items.json"), example.to_string()).unwrap();
}

/// Build the app with the given configuration tweaks, load [`ITEMS_CSV`]
/// into a fresh store, and return it.
pub async fn build_test_app_with(tweak: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("data")).unwrap();
    write_config(&root.join("config"));
    fs::write(root.join("data/items.csv"), ITEMS_CSV).unwrap();

    let mut config = test_config(root);
    tweak(&mut config);

    let pool = isdb_db::create_pool(&config.database_url).await.unwrap();
    isdb_db::run_migrations(&pool).await.unwrap();
    assert!(isdb_db::ensure_fts(&pool).await);

    let backups = Arc::new(BackupManager::new(&config.backup_dir));
    backups.setup().unwrap();

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        config_manager: Arc::new(ConfigManager::new(&config.config_dir)),
        backups,
    };
    let report = reload_store(&state).await.unwrap();
    assert!(report.stored, "{:?}", report.result);

    TestApp { dir, state, config }
}

pub async fn build_test_app() -> TestApp {
    build_test_app_with(|_| {}).await
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
