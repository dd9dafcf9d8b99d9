//! Search helpers shared by the store and the HTTP layer.
//!
//! This module lives in `core` (no database access) so the query-building
//! and category rules can be unit tested without a store.

use serde::Serialize;
use serde_json::Value;

use crate::config::CategorySet;
use crate::item::{value_to_text, Item};

// ---------------------------------------------------------------------------
// Combined name column
// ---------------------------------------------------------------------------

/// Prefix that rows of the category labelled `label` start with.
pub fn category_prefix(label: &str) -> String {
    format!("{label} ")
}

/// The denormalized `"<display name> <item name>"` value persisted for
/// `item`. Unconfigured categories use the raw category text. Items
/// lacking a category or a name are not persisted and yield `None`.
pub fn combined_name(item: &Item, categories: &CategorySet) -> Option<String> {
    if item.category.is_empty() || item.name.is_empty() {
        return None;
    }
    let label = categories.display_name_or_key(&item.category);
    Some(format!("{label} {}", item.name))
}

// ---------------------------------------------------------------------------
// Category universe
// ---------------------------------------------------------------------------

/// One entry of the set of categories a request can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLabel {
    pub key: String,
    pub display_name: String,
    /// `false` for labels only observed in persisted rows.
    pub configured: bool,
}

/// Configured categories in configuration order, followed by labels
/// observed in persisted rows that are neither a configured key nor a
/// configured display name.
pub fn category_universe<I>(categories: &CategorySet, observed: I) -> Vec<CategoryLabel>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut universe: Vec<CategoryLabel> = categories
        .iter()
        .map(|c| CategoryLabel {
            key: c.key.clone(),
            display_name: c.display_name.clone(),
            configured: true,
        })
        .collect();

    for label in observed {
        let label = label.as_ref();
        if label.is_empty()
            || categories.contains(label)
            || categories.is_display_name(label)
            || universe.iter().any(|c| c.key == label)
        {
            continue;
        }
        universe.push(CategoryLabel {
            key: label.to_string(),
            display_name: label.to_string(),
            configured: false,
        });
    }
    universe
}

// ---------------------------------------------------------------------------
// Full-text query builder
// ---------------------------------------------------------------------------

/// Split user input into terms, stripping punctuation from the edges of
/// each term. Returns `None` if nothing usable remains.
fn sanitize_terms(query: &str) -> Option<Vec<&str>> {
    let terms: Vec<&str> = query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() { None } else { Some(terms) }
}

/// Convert user input into an FTS5 `MATCH` expression.
///
/// Every term becomes a quoted string token, so operators and punctuation
/// in the input are matched literally; tokens are joined by implicit AND.
///
/// # Examples
///
/// ```
/// use isdb_core::search::build_fts_query;
/// assert_eq!(build_fts_query("iron sword"), Some(r#""iron" "sword""#.to_string()));
/// assert_eq!(build_fts_query("  ?! "), None);
/// ```
pub fn build_fts_query(query: &str) -> Option<String> {
    sanitize_terms(query).map(|terms| {
        terms
            .iter()
            .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" ")
    })
}

// ---------------------------------------------------------------------------
// Field filter
// ---------------------------------------------------------------------------

/// Parse a comma-separated `fields` parameter into trimmed, non-empty names.
pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive containment of `query` in the text form of `value`.
pub fn value_contains(value: &Value, query: &str) -> bool {
    value_to_text(value)
        .to_lowercase()
        .contains(&query.to_lowercase())
}
