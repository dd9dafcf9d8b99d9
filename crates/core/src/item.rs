//! Item entity model.
//!
//! An [`Item`] has four fixed fields (`id`, `category`, `name`,
//! `description`) and an ordered bag of named custom values. Custom values
//! are only ever addressed by name, never by position.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::DbId;

/// Field names that map onto the fixed [`Item`] attributes.
pub const STANDARD_FIELDS: &[&str] = &["id", "category", "name", "description"];

/// Fields included in [`Item::search_text`] when none are configured.
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &["category", "name", "description"];

/// `{field}` placeholders inside a display format string.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Whether `name` refers to one of the fixed item attributes.
pub fn is_standard_field(name: &str) -> bool {
    STANDARD_FIELDS.contains(&name)
}

/// Truthiness of a field value: null, empty strings, zero, `false` and
/// empty containers are all "empty".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a value as plain text. Strings are returned without quotes and
/// null renders as the empty string.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A single searchable record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Assigned when the item is persisted.
    pub id: Option<DbId>,
    pub category: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub custom_fields: IndexMap<String, Value>,
}

impl Item {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            category: category.into(),
            name: name.into(),
            description: description.into(),
            custom_fields: IndexMap::new(),
        }
    }

    /// Builder-style helper to attach a custom field.
    pub fn with_custom(mut self, field: impl Into<String>, value: Value) -> Self {
        self.custom_fields.insert(field.into(), value);
        self
    }

    /// Look up a standard or custom field by name.
    ///
    /// Returns `None` when the field is absent (an unset `id` or a custom
    /// field that was never populated).
    pub fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => self.id.map(Value::from),
            "category" => Some(Value::String(self.category.clone())),
            "name" => Some(Value::String(self.name.clone())),
            "description" => Some(Value::String(self.description.clone())),
            other => self.custom_fields.get(other).cloned(),
        }
    }

    /// Set a standard or custom field by name.
    ///
    /// Non-string values written to a text attribute are rendered with
    /// [`value_to_text`]; a non-integer `id` clears it.
    pub fn set_field_value(&mut self, field: &str, value: Value) {
        match field {
            "id" => self.id = value.as_i64(),
            "category" => self.category = value_to_text(&value),
            "name" => self.name = value_to_text(&value),
            "description" => self.description = value_to_text(&value),
            other => {
                self.custom_fields.insert(other.to_string(), value);
            }
        }
    }

    /// Human-facing label for this item.
    ///
    /// With a `display_format` such as `"{category}: {name} ({rarity})"`,
    /// placeholders are substituted from standard and custom fields. If any
    /// placeholder cannot be resolved, the default `"<category> <name>"`
    /// form is used instead.
    pub fn display_name(&self, display_format: Option<&str>) -> String {
        if let Some(formatted) = display_format.and_then(|f| self.apply_format(f)) {
            return formatted;
        }

        match (self.category.is_empty(), self.name.is_empty()) {
            (false, false) => format!("{} {}", self.category, self.name),
            (_, false) => self.name.clone(),
            _ => match self.id {
                Some(id) => format!("Item {id}"),
                None => "Unnamed Item".to_string(),
            },
        }
    }

    fn apply_format(&self, format: &str) -> Option<String> {
        let mut missing = false;
        let rendered = PLACEHOLDER_RE.replace_all(format, |caps: &regex::Captures<'_>| {
            match self.field_value(&caps[1]) {
                Some(value) => value_to_text(&value),
                None => {
                    missing = true;
                    String::new()
                }
            }
        });
        if missing {
            None
        } else {
            Some(rendered.into_owned())
        }
    }

    /// Concatenate the configured search fields into one space-separated
    /// string. Empty and null values are skipped.
    pub fn search_text(&self, search_fields: Option<&[String]>) -> String {
        let defaults: Vec<String>;
        let fields = match search_fields {
            Some(f) => f,
            None => {
                defaults = DEFAULT_SEARCH_FIELDS.iter().map(|s| s.to_string()).collect();
                &defaults
            }
        };

        fields
            .iter()
            .filter(|f| f.as_str() != "id")
            .filter_map(|f| self.field_value(f))
            .map(|v| value_to_text(&v))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flatten the item into a single JSON object: the fixed fields plus
    /// every custom field at the top level. Fixed fields win on name clashes.
    pub fn to_flat_map(&self) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.custom_fields {
            if !is_standard_field(key) {
                map.insert(key.clone(), value.clone());
            }
        }
        map.insert("id".into(), self.id.map(Value::from).unwrap_or(Value::Null));
        map.insert("category".into(), Value::String(self.category.clone()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("description".into(), Value::String(self.description.clone()));
        map
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name(None))
    }
}

/// Summary statistics over a batch of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataStats {
    pub total_items: usize,
    pub categories: IndexMap<String, usize>,
    pub fields: Vec<String>,
    pub custom_fields: Vec<String>,
}

impl DataStats {
    pub fn from_items(items: &[Item]) -> Self {
        let mut categories: IndexMap<String, usize> = IndexMap::new();
        let mut custom: BTreeSet<String> = BTreeSet::new();

        for item in items {
            if !item.category.is_empty() {
                *categories.entry(item.category.clone()).or_default() += 1;
            }
            custom.extend(item.custom_fields.keys().cloned());
        }

        Self {
            total_items: items.len(),
            categories,
            fields: STANDARD_FIELDS.iter().map(|s| s.to_string()).collect(),
            custom_fields: custom.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sword() -> Item {
        Item::new("weapon", "Sword", "A blade").with_custom("attack", json!(5))
    }

    #[test]
    fn field_value_reads_standard_and_custom_fields() {
        let item = sword();
        assert_eq!(item.field_value("name"), Some(json!("Sword")));
        assert_eq!(item.field_value("attack"), Some(json!(5)));
        assert_eq!(item.field_value("id"), None);
        assert_eq!(item.field_value("missing"), None);
    }

    #[test]
    fn set_field_value_routes_to_fixed_attributes() {
        let mut item = sword();
        item.set_field_value("name", json!("Axe"));
        item.set_field_value("id", json!(9));
        item.set_field_value("weight", json!(3.5));

        assert_eq!(item.name, "Axe");
        assert_eq!(item.id, Some(9));
        assert_eq!(item.custom_fields["weight"], json!(3.5));
    }

    #[test]
    fn display_name_defaults_to_category_and_name() {
        assert_eq!(sword().display_name(None), "weapon Sword");
        assert_eq!(Item::new("", "Sword", "").display_name(None), "Sword");
        assert_eq!(Item::new("", "", "").display_name(None), "Unnamed Item");

        let mut anonymous = Item::new("", "", "");
        anonymous.id = Some(4);
        assert_eq!(anonymous.display_name(None), "Item 4");
    }

    #[test]
    fn display_name_applies_format_with_custom_fields() {
        let item = sword();
        assert_eq!(
            item.display_name(Some("{name} [{attack}]")),
            "Sword [5]"
        );
    }

    #[test]
    fn display_name_falls_back_when_placeholder_missing() {
        assert_eq!(sword().display_name(Some("{name} {rarity}")), "weapon Sword");
    }

    #[test]
    fn search_text_uses_requested_fields_in_order() {
        let item = sword();
        let fields = vec!["attack".to_string(), "name".to_string()];
        assert_eq!(item.search_text(Some(&fields)), "5 Sword");
        assert_eq!(item.search_text(None), "weapon Sword A blade");
    }

    #[test]
    fn search_text_skips_null_values() {
        let item = Item::new("weapon", "Sword", "").with_custom("note", Value::Null);
        let fields = vec!["note".to_string(), "name".to_string(), "description".to_string()];
        assert_eq!(item.search_text(Some(&fields)), "Sword");
    }

    #[test]
    fn flat_map_puts_custom_fields_at_top_level() {
        let map = sword().to_flat_map();
        assert_eq!(map["attack"], json!(5));
        assert_eq!(map["name"], json!("Sword"));
        assert_eq!(map["id"], Value::Null);
    }

    #[test]
    fn truthiness_matches_empty_semantics() {
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&Value::Null));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(0.5)));
    }

    #[test]
    fn stats_count_categories_and_custom_fields() {
        let items = vec![
            sword(),
            Item::new("weapon", "Axe", "").with_custom("weight", json!(2)),
            Item::new("shield", "Buckler", ""),
        ];
        let stats = DataStats::from_items(&items);
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.categories["weapon"], 2);
        assert_eq!(stats.custom_fields, vec!["attack", "weight"]);
    }
}
