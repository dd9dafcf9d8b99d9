//! Embedded SQLite store for items and their full-text shadow index.

pub mod models;
pub mod pipeline;
pub mod repositories;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool from a database URL, creating the database
/// file if it does not exist.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Round-trip a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Create the `items_fts` index over `items(name, description)`.
///
/// Returns `false` when the SQLite build lacks FTS5; search then runs
/// without the full-text fallback.
pub async fn ensure_fts(pool: &DbPool) -> bool {
    let result = sqlx::query(
        "CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(\
             name, description, content='items', content_rowid='id'\
         )",
    )
    .execute(pool)
    .await;

    match result {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Full-text index unavailable");
            false
        }
    }
}
