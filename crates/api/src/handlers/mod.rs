pub mod backups;
pub mod config;
pub mod data;
pub mod search;
pub mod system;

use crate::error::{AppError, AppResult};

/// Run synchronous file work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::InternalError(format!("Blocking task failed: {e}")))?
}
