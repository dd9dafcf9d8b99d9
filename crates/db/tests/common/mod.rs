#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use isdb_core::config::{CategoryConfig, CategorySet, ConfigManager};
use isdb_db::DbPool;
use serde_json::json;

/// A migrated on-disk SQLite database inside `dir`, with the full-text
/// index created.
pub async fn test_pool(dir: &Path) -> DbPool {
    let url = format!("sqlite://{}", dir.join("test.db").display());
    let pool = isdb_db::create_pool(&url).await.unwrap();
    isdb_db::run_migrations(&pool).await.unwrap();
    assert!(isdb_db::ensure_fts(&pool).await, "bundled SQLite ships FTS5");
    pool
}

pub fn category(display_name: &str) -> CategoryConfig {
    CategoryConfig {
        key: String::new(),
        display_name: display_name.to_string(),
        icon: String::new(),
        emoji_fallback: String::new(),
        color: "#e74c3c".to_string(),
        description: String::new(),
    }
}

/// `weapon` -> `Weapon`, `shield` -> `Shield`.
pub fn english_categories() -> CategorySet {
    let mut set = CategorySet::new();
    set.insert("weapon", category("Weapon"));
    set.insert("shield", category("Shield"));
    set
}

/// A configuration directory whose categories match [`english_categories`].
pub fn config_dir(root: &Path) -> ConfigManager {
    let dir = root.join("config");
    fs::create_dir_all(&dir).unwrap();
    let doc = json!({
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
    fs::write(dir.join("categories.json"), doc.to_string()).unwrap();
    ConfigManager::new(dir)
}

pub fn write_csv(root: &Path, contents: &str) -> PathBuf {
    let path = root.join("items.csv");
    fs::write(&path, contents).unwrap();
    path
}
