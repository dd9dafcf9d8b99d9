//! Typed configuration documents.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coercion::FieldType;

/// Color assigned to a category whose configured color is not a valid
/// six-digit hex code.
pub const FALLBACK_CATEGORY_COLOR: &str = "#95a5a6";

/// Whether `color` is a `#rrggbb` hex code.
pub fn is_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Display metadata for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Stable key; filled in from the surrounding map, never read from JSON.
    #[serde(skip)]
    pub key: String,
    /// Prefixed onto the persisted name column. Renaming it orphans rows
    /// persisted under the old name until the store is rebuilt.
    pub display_name: String,
    #[serde(alias = "icon_ref")]
    pub icon: String,
    pub emoji_fallback: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
}

/// The configured categories, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySet {
    entries: IndexMap<String, CategoryConfig>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category, overwriting its `key` field with `key`.
    pub fn insert(&mut self, key: impl Into<String>, mut config: CategoryConfig) {
        let key = key.into();
        config.key = key.clone();
        self.entries.insert(key, config);
    }

    pub fn get(&self, key: &str) -> Option<&CategoryConfig> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryConfig> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name configured for `key`, if the key is known.
    pub fn display_name(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|c| c.display_name.as_str())
    }

    /// Display name for `key`, or the key itself when it is not configured.
    pub fn display_name_or_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.display_name(key).unwrap_or(key)
    }

    /// Whether `label` is the display name of some configured category.
    pub fn is_display_name(&self, label: &str) -> bool {
        self.entries.values().any(|c| c.display_name == label)
    }
}

impl Serialize for CategorySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Declared type and constraints of one logical field.
///
/// The same shape is used for `field_definitions` in the fields document
/// and for `field_types` in a validation rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    /// CSV header this field is read from when it has no `field_mappings` entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_required_fields() -> Vec<String> {
    vec!["category".to_string(), "name".to_string()]
}

/// The field-mapping document (`fields.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsConfig {
    /// Logical field name -> CSV column header.
    #[serde(default)]
    pub field_mappings: IndexMap<String, String>,
    #[serde(default)]
    pub display_fields: Vec<String>,
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub field_definitions: IndexMap<String, FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,
}

impl FieldsConfig {
    /// Mappings used for ingestion: `field_mappings` first, then any
    /// definition that names its own `csv_column` and is not already mapped.
    pub fn effective_mappings(&self) -> IndexMap<String, String> {
        let mut mappings = self.field_mappings.clone();
        for (name, def) in &self.field_definitions {
            if let Some(column) = &def.csv_column {
                mappings.entry(name.clone()).or_insert_with(|| column.clone());
            }
        }
        mappings
    }

    /// Declared type of `field`, defaulting to `string`.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.field_definitions
            .get(field)
            .map(|d| d.field_type)
            .unwrap_or_default()
    }

    /// Whether `field` is mapped or defined by this document.
    pub fn knows_field(&self, field: &str) -> bool {
        self.field_mappings.contains_key(field) || self.field_definitions.contains_key(field)
    }
}

// ---------------------------------------------------------------------------
// UI
// ---------------------------------------------------------------------------

pub const DEFAULT_UI_TITLE: &str = "アイテム検索システム";

fn default_ui_title() -> String {
    DEFAULT_UI_TITLE.to_string()
}

/// Presentation settings for the search page (`ui.json`, under `"ui"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_ui_title")]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub theme: serde_json::Map<String, Value>,
    #[serde(default)]
    pub layout: serde_json::Map<String, Value>,
    #[serde(default)]
    pub search: serde_json::Map<String, Value>,
    #[serde(default)]
    pub categories: serde_json::Map<String, Value>,
}

/// Wire shape of `ui.json`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UiDocument {
    pub ui: UiConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_color_requires_six_digits() {
        assert!(is_hex_color("#e74c3c"));
        assert!(is_hex_color("#ABCDEF"));
        assert!(!is_hex_color("e74c3c"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("#gggggg"));
    }

    #[test]
    fn category_set_resolves_display_names() {
        let mut set = CategorySet::new();
        set.insert(
            "weapon",
            CategoryConfig {
                key: String::new(),
                display_name: "Weapon".into(),
                icon: "fas fa-sword".into(),
                emoji_fallback: "⚔️".into(),
                color: "#e74c3c".into(),
                description: String::new(),
            },
        );

        assert_eq!(set.get("weapon").unwrap().key, "weapon");
        assert_eq!(set.display_name_or_key("weapon"), "Weapon");
        assert_eq!(set.display_name_or_key("potion"), "potion");
        assert!(set.is_display_name("Weapon"));
        assert!(!set.is_display_name("weapon"));
    }

    #[test]
    fn fields_config_defaults_required_fields() {
        let cfg: FieldsConfig = serde_json::from_value(json!({
            "field_mappings": {"name": "item_name"}
        }))
        .unwrap();
        assert_eq!(cfg.required_fields, vec!["category", "name"]);
        assert_eq!(cfg.field_type("name"), FieldType::String);
    }

    #[test]
    fn effective_mappings_include_definition_columns() {
        let cfg: FieldsConfig = serde_json::from_value(json!({
            "field_mappings": {"name": "name"},
            "field_definitions": {
                "price": {"type": "integer", "csv_column": "buy_price"},
                "name": {"type": "string", "csv_column": "ignored"}
            }
        }))
        .unwrap();

        let mappings = cfg.effective_mappings();
        assert_eq!(mappings["name"], "name");
        assert_eq!(mappings["price"], "buy_price");
        assert_eq!(cfg.field_type("price"), FieldType::Integer);
    }
}
