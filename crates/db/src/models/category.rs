//! Per-category row counts.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub key: String,
    pub display_name: String,
    pub count: i64,
    /// `false` for categories only observed in persisted rows.
    pub configured: bool,
}
