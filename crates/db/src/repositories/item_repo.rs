//! Repository for the `items` table and its `items_fts` shadow index.

use isdb_core::config::CategorySet;
use isdb_core::item::Item;
use sqlx::SqlitePool;

use crate::models::item::{ItemRow, NewItemRow, PersistOutcome};

/// Column list for `items` queries.
pub(crate) const COLUMNS: &str = "id, name, description, custom_fields";

/// Provides bulk persistence and listing for items.
pub struct ItemRepo;

impl ItemRepo {
    /// Replace the whole store with `items` in one transaction, then
    /// rebuild the full-text index.
    ///
    /// Items without a category or a name are skipped. Ids restart at 1 so
    /// re-loading the same data yields the same ids.
    pub async fn replace_all(
        pool: &SqlitePool,
        items: &[Item],
        categories: &CategorySet,
    ) -> Result<PersistOutcome, sqlx::Error> {
        let rows: Vec<NewItemRow> = items
            .iter()
            .filter_map(|item| NewItemRow::from_item(item, categories))
            .collect();
        let skipped = items.len() - rows.len();
        let fts = Self::fts_available(pool).await?;

        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM items").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'items'")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0;
        for row in &rows {
            inserted += sqlx::query(
                "INSERT INTO items (category, name, description, custom_fields) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&row.category)
            .bind(&row.name)
            .bind(&row.description)
            .bind(&row.custom_fields)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        if fts {
            sqlx::query("INSERT INTO items_fts(items_fts) VALUES('rebuild')")
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(inserted, skipped, fts, "Replaced item store");
        Ok(PersistOutcome { inserted, skipped })
    }

    /// Whether the `items_fts` table exists.
    pub async fn fts_available(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
        let found: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'items_fts'",
        )
        .fetch_optional(pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// All rows in insertion order.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items ORDER BY id");
        sqlx::query_as::<_, ItemRow>(&query).fetch_all(pool).await
    }
}
