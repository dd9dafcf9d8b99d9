use std::sync::Arc;

use isdb_core::backup::BackupManager;
use isdb_core::config::ConfigManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: isdb_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Categories, field mappings, and UI documents with their cache.
    pub config_manager: Arc<ConfigManager>,
    pub backups: Arc<BackupManager>,
}
