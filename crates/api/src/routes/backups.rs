//! Backup routes, mounted at `/backups`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::backups;
use crate::state::AppState;

/// ```text
/// GET  /           -> list_backups
/// POST /           -> create_backup
/// GET  /stats      -> backup_stats
/// POST /cleanup    -> cleanup_backups
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(backups::list_backups).post(backups::create_backup))
        .route("/stats", get(backups::backup_stats))
        .route("/cleanup", post(backups::cleanup_backups))
}
