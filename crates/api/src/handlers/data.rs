//! Handlers for category counts and reloading the store from CSV.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use isdb_db::pipeline::{load_csv_into_store, LoadOptions};
use isdb_db::repositories::SearchRepo;

use crate::error::AppResult;
use crate::handlers::blocking;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/categories/counts
pub async fn category_counts(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let manager = state.config_manager.clone();
    let categories = blocking(move || Ok(manager.categories())).await?;
    let counts = SearchRepo::category_counts(&state.pool, &categories).await?;
    Ok(Json(DataResponse { data: counts }))
}

/// POST /api/data/reload
///
/// Re-read configuration and rebuild the store from the CSV source. Rows
/// persisted under an old category display name are rewritten here.
pub async fn reload(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    state.config_manager.clear_cache();
    let report = reload_store(&state).await?;
    Ok(Json(DataResponse { data: report }))
}

/// Run the load pipeline with the server's settings.
pub async fn reload_store(state: &AppState) -> AppResult<isdb_db::pipeline::LoadReport> {
    let config = &state.config;
    let backups = config.backup_before_load.then(|| Arc::clone(&state.backups));
    let options = LoadOptions {
        csv_path: config.csv_path.clone(),
        rules_path: Some(config.validation_schema_path.clone()),
        strict: config.strict_validation,
    };

    let report = load_csv_into_store(&state.pool, &state.config_manager, backups, options).await?;
    Ok(report)
}
