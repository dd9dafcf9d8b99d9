//! Item rows and search records.

use isdb_core::config::CategorySet;
use isdb_core::item::Item;
use isdb_core::search::combined_name;
use isdb_core::types::DbId;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemRow {
    pub id: DbId,
    /// Combined `"<category display name> <item name>"` text.
    pub name: String,
    pub description: String,
    /// JSON object text.
    pub custom_fields: String,
}

impl ItemRow {
    /// Custom fields as a map. Anything but a JSON object reads as empty.
    pub fn custom_map(&self) -> Map<String, Value> {
        match serde_json::from_str(&self.custom_fields) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                tracing::warn!(id = self.id, error = %e, "Unreadable custom fields");
                Map::new()
            }
        }
    }

    pub fn into_record(self) -> SearchRecord {
        let custom = self.custom_map();
        SearchRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            custom,
        }
    }
}

// ---------------------------------------------------------------------------
// Insert DTO
// ---------------------------------------------------------------------------

/// An item prepared for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItemRow {
    /// Raw category key as ingested.
    pub category: String,
    pub name: String,
    pub description: String,
    pub custom_fields: String,
}

impl NewItemRow {
    /// `None` for items lacking a category or a name.
    pub fn from_item(item: &Item, categories: &CategorySet) -> Option<Self> {
        let name = combined_name(item, categories)?;
        let custom: Map<String, Value> = item
            .custom_fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self {
            category: item.category.clone(),
            name,
            description: item.description.clone(),
            custom_fields: Value::Object(custom).to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Search record
// ---------------------------------------------------------------------------

/// One search hit: fixed columns plus custom fields flattened to the top
/// level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRecord {
    pub id: DbId,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl SearchRecord {
    /// Look up a field of the flattened record.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "name" => Some(Value::String(self.name.clone())),
            "description" => Some(Value::String(self.description.clone())),
            other => self.custom.get(other).cloned(),
        }
    }
}

/// Outcome of replacing the store contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    pub inserted: u64,
    /// Items dropped for lacking a category or a name.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdb_core::config::defaults;
    use serde_json::json;

    #[test]
    fn new_row_combines_display_name_and_keeps_custom_order() {
        let item = Item::new("武器", "剣", "鋭い")
            .with_custom("rarity", json!("rare"))
            .with_custom("attack", json!(12));
        let row = NewItemRow::from_item(&item, &defaults::categories()).unwrap();
        assert_eq!(row.category, "武器");
        assert_eq!(row.name, "武器 剣");
        assert_eq!(row.custom_fields, r#"{"rarity":"rare","attack":12}"#);
    }

    #[test]
    fn record_flattens_custom_fields() {
        let row = ItemRow {
            id: 3,
            name: "Weapon Sword".into(),
            description: "A blade".into(),
            custom_fields: r#"{"rarity":"rare"}"#.into(),
        };
        let json = serde_json::to_value(row.into_record()).unwrap();
        assert_eq!(
            json,
            json!({"id": 3, "name": "Weapon Sword", "description": "A blade", "rarity": "rare"})
        );
    }

    #[test]
    fn malformed_custom_fields_read_as_empty() {
        let row = ItemRow {
            id: 1,
            name: "x y".into(),
            description: String::new(),
            custom_fields: "[1,2]".into(),
        };
        assert!(row.custom_map().is_empty());
    }
}
