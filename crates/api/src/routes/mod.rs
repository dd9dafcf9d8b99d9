pub mod backups;
pub mod config;
pub mod data;
pub mod health;
pub mod search;
pub mod system;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /system/health                 configuration health
///
/// /config                        current documents
/// /config/validate               force-reload and validate
/// /config/examples               list examples
/// /config/examples/{name}        one example
///
/// /categories/counts             rows per category
/// /data/reload                   rebuild the store from CSV (POST)
///
/// /backups                       list, create
/// /backups/stats                 statistics
/// /backups/cleanup               retention run (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/system", system::router())
        .nest("/config", config::router())
        .merge(data::router())
        .nest("/backups", backups::router())
}
