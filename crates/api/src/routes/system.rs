use axum::routing::get;
use axum::Router;

use crate::handlers::system;
use crate::state::AppState;

/// ```text
/// GET /health   -> system_health
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(system::system_health))
}
