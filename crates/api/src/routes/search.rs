//! The search page and search endpoint, mounted at the root.

use axum::routing::get;
use axum::Router;

use crate::handlers::search;
use crate::state::AppState;

/// ```text
/// GET /          -> index
/// GET /search    -> search
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search::index))
        .route("/search", get(search::search))
}
