//! Search queries over `items`: category prefix filter, substring match
//! with a full-text fallback, and category counts.
//!
//! Matching is case-sensitive on the substring path (`instr`) and follows
//! the FTS5 `unicode61` tokenizer (ASCII case-folded) on the fallback path.

use isdb_core::config::CategorySet;
use isdb_core::search::{build_fts_query, category_prefix, category_universe, CategoryLabel};
use sqlx::SqlitePool;

use crate::models::category::CategoryCount;
use crate::models::item::ItemRow;
use crate::repositories::item_repo::COLUMNS;

/// `COLUMNS` qualified for the `items_fts` join.
const JOINED_COLUMNS: &str = "items.id, items.name, items.description, items.custom_fields";

/// Provides search and aggregation queries for items.
pub struct SearchRepo;

impl SearchRepo {
    /// Run a search.
    ///
    /// An empty `query` returns no rows without touching the store. A
    /// non-empty `category_filter` selects the category path, which ignores
    /// the query text; otherwise the keyword path runs.
    pub async fn search(
        pool: &SqlitePool,
        query: &str,
        category_filter: &str,
        categories: &CategorySet,
    ) -> Result<Vec<ItemRow>, sqlx::Error> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if category_filter.is_empty() {
            Self::by_keyword(pool, query).await
        } else {
            Self::by_category(pool, category_filter, categories).await
        }
    }

    /// Rows of a category: the configured display-name prefix first, then
    /// the raw filter text as prefix.
    pub async fn by_category(
        pool: &SqlitePool,
        category_filter: &str,
        categories: &CategorySet,
    ) -> Result<Vec<ItemRow>, sqlx::Error> {
        if let Some(display_name) = categories.display_name(category_filter) {
            let rows = Self::with_prefix(pool, &category_prefix(display_name)).await?;
            if !rows.is_empty() {
                return Ok(rows);
            }
        }
        Self::with_prefix(pool, &category_prefix(category_filter)).await
    }

    /// Substring match on name or description. When that finds nothing the
    /// full-text index is tried, and its rows replace the empty result only
    /// if there are any.
    pub async fn by_keyword(pool: &SqlitePool, query: &str) -> Result<Vec<ItemRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM items \
             WHERE instr(name, ?1) > 0 OR instr(description, ?1) > 0 \
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(query)
            .fetch_all(pool)
            .await?;
        if !rows.is_empty() {
            tracing::debug!(query, count = rows.len(), "Substring search");
            return Ok(rows);
        }

        let fts_rows = Self::full_text(pool, query).await;
        if fts_rows.is_empty() {
            Ok(rows)
        } else {
            tracing::debug!(query, count = fts_rows.len(), "Full-text fallback");
            Ok(fts_rows)
        }
    }

    /// Full-text match. A missing index, an unusable query, or an FTS error
    /// all yield no rows.
    async fn full_text(pool: &SqlitePool, query: &str) -> Vec<ItemRow> {
        let Some(fts_query) = build_fts_query(query) else {
            return Vec::new();
        };
        let sql = format!(
            "SELECT {JOINED_COLUMNS} FROM items_fts \
             JOIN items ON items.id = items_fts.rowid \
             WHERE items_fts MATCH ?1 \
             ORDER BY items_fts.rank"
        );
        match sqlx::query_as::<_, ItemRow>(&sql)
            .bind(&fts_query)
            .fetch_all(pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::debug!(query = %fts_query, error = %e, "Full-text search failed");
                Vec::new()
            }
        }
    }

    async fn with_prefix(pool: &SqlitePool, prefix: &str) -> Result<Vec<ItemRow>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM items WHERE instr(name, ?1) = 1 ORDER BY id");
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(prefix)
            .fetch_all(pool)
            .await
    }

    /// Rows stored under `label`'s key or display name. Rows without a
    /// stored key are matched by their combined-name prefix instead.
    async fn count_label(pool: &SqlitePool, label: &CategoryLabel) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM items \
             WHERE category IN (?1, ?2) \
                OR (category = '' AND (instr(name, ?3) = 1 OR instr(name, ?4) = 1))",
        )
        .bind(&label.key)
        .bind(&label.display_name)
        .bind(category_prefix(&label.display_name))
        .bind(category_prefix(&label.key))
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Distinct category keys currently stored.
    pub async fn observed_categories(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM items WHERE category <> '' ORDER BY category",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(category,)| category).collect())
    }

    /// Row counts for every category in the universe: configured categories
    /// in configuration order, then stored keys that are not configured.
    pub async fn category_counts(
        pool: &SqlitePool,
        categories: &CategorySet,
    ) -> Result<Vec<CategoryCount>, sqlx::Error> {
        let observed = Self::observed_categories(pool).await?;
        let universe = category_universe(categories, observed);

        let mut counts = Vec::with_capacity(universe.len());
        for label in universe {
            let count = Self::count_label(pool, &label).await?;
            counts.push(CategoryCount {
                key: label.key,
                display_name: label.display_name,
                count,
                configured: label.configured,
            });
        }
        Ok(counts)
    }
}
