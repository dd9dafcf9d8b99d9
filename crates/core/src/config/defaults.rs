//! Built-in documents used when a configuration file is missing or unusable.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use super::model::{CategoryConfig, CategorySet, FieldsConfig, UiConfig, DEFAULT_UI_TITLE};

fn category(display_name: &str, icon: &str, emoji: &str, color: &str, description: &str) -> CategoryConfig {
    CategoryConfig {
        key: String::new(),
        display_name: display_name.to_string(),
        icon: icon.to_string(),
        emoji_fallback: emoji.to_string(),
        color: color.to_string(),
        description: description.to_string(),
    }
}

/// 武器 (weapon), 盾 (shield) and the その他 (other) catch-all.
pub fn categories() -> CategorySet {
    let mut set = CategorySet::new();
    set.insert("武器", category("武器", "fas fa-sword", "⚔️", "#e74c3c", "攻撃用のアイテム"));
    set.insert("盾", category("盾", "fas fa-shield-alt", "🛡️", "#3498db", "防御用のアイテム"));
    set.insert("その他", category("その他", "fas fa-question", "❓", "#95a5a6", "その他のアイテム"));
    set
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn fields() -> FieldsConfig {
    let field_mappings: IndexMap<String, String> = ["category", "name", "description"]
        .into_iter()
        .map(|f| (f.to_string(), f.to_string()))
        .collect();

    FieldsConfig {
        field_mappings,
        display_fields: strings(&["name", "description"]),
        search_fields: strings(&["name", "description"]),
        required_fields: strings(&["category", "name"]),
        field_definitions: IndexMap::new(),
        display_format: None,
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn ui() -> UiConfig {
    UiConfig {
        title: DEFAULT_UI_TITLE.to_string(),
        subtitle: "アイテムを素早く検索できます".to_string(),
        theme: object(json!({
            "primary_color": "#667eea",
            "secondary_color": "#764ba2",
            "background_gradient": "linear-gradient(135deg, #667eea 0%, #764ba2 100%)"
        })),
        layout: object(json!({
            "categories_per_row": 5,
            "show_category_counts": true,
            "enable_suggestions": true
        })),
        search: object(json!({
            "placeholder": "アイテム名を入力してください...",
            "min_query_length": 1
        })),
        categories: object(json!({ "show_all_option": true })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_categories_include_catch_all() {
        let set = categories();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["武器", "盾", "その他"]);
        assert_eq!(set.get("その他").unwrap().color, "#95a5a6");
    }

    #[test]
    fn default_fields_require_category_and_name() {
        let cfg = fields();
        assert_eq!(cfg.required_fields, vec!["category", "name"]);
        assert_eq!(cfg.search_fields, cfg.display_fields);
    }

    #[test]
    fn default_ui_layout_enables_counts() {
        assert_eq!(ui().layout["show_category_counts"], Value::Bool(true));
    }
}
