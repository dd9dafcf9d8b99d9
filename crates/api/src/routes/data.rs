use axum::routing::{get, post};
use axum::Router;

use crate::handlers::data;
use crate::state::AppState;

/// ```text
/// GET  /categories/counts   -> category_counts
/// POST /data/reload         -> reload
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories/counts", get(data::category_counts))
        .route("/data/reload", post(data::reload))
}
