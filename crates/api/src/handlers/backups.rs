//! Handlers for backup listing, creation, statistics and retention runs.

use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use isdb_core::backup::BackupType;
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::blocking;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBackupRequest {
    pub source_path: PathBuf,
    pub backup_type: String,
    pub description: Option<String>,
}

/// GET /api/backups
pub async fn list_backups(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let backups = state.backups.clone();
    let records = blocking(move || Ok(backups.list()?)).await?;
    Ok(Json(DataResponse { data: records }))
}

/// POST /api/backups
///
/// The source must live under the CSV directory, the configuration
/// directory, or the database file's directory.
pub async fn create_backup(
    State(state): State<AppState>,
    Json(input): Json<CreateBackupRequest>,
) -> AppResult<impl IntoResponse> {
    let backup_type: BackupType = input.backup_type.parse()?;
    ensure_allowed_source(&input.source_path, &state.config)?;

    let backups = state.backups.clone();
    let path = blocking(move || {
        Ok(backups.backup(&input.source_path, backup_type, input.description.as_deref())?)
    })
    .await?;

    tracing::info!(path = %path.display(), %backup_type, "Backup created via API");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: serde_json::json!({ "backup_path": path }),
        }),
    ))
}

/// GET /api/backups/stats
pub async fn backup_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let backups = state.backups.clone();
    let stats = blocking(move || Ok(backups.statistics()?)).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// POST /api/backups/cleanup
pub async fn cleanup_backups(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let backups = state.backups.clone();
    let report = blocking(move || Ok(backups.cleanup()?)).await?;
    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// Source restriction
// ---------------------------------------------------------------------------

fn allowed_roots(config: &ServerConfig) -> Vec<PathBuf> {
    let mut roots = vec![config.config_dir.clone()];
    if let Some(parent) = config.csv_path.parent() {
        roots.push(parent.to_path_buf());
    }
    if let Some(db_path) = config.database_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            roots.push(parent.to_path_buf());
        }
    }
    roots
        .into_iter()
        .map(|root| if root.as_os_str().is_empty() { PathBuf::from(".") } else { root })
        .filter_map(|root| root.canonicalize().ok())
        .collect()
}

fn ensure_allowed_source(source: &Path, config: &ServerConfig) -> AppResult<()> {
    // Missing sources fall through to the backup manager's not-found error.
    let Ok(source) = source.canonicalize() else {
        return Ok(());
    };
    if allowed_roots(config).iter().any(|root| source.starts_with(root)) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Source path {} is outside the data, configuration and database directories",
            source.display()
        )))
    }
}
