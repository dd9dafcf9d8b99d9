//! Configuration routes, mounted at `/config`.

use axum::routing::get;
use axum::Router;

use crate::handlers::config;
use crate::state::AppState;

/// ```text
/// GET /                  -> get_config
/// GET /validate          -> validate_config
/// GET /examples          -> list_examples
/// GET /examples/{name}   -> get_example
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(config::get_config))
        .route("/validate", get(config::validate_config))
        .route("/examples", get(config::list_examples))
        .route("/examples/{name}", get(config::get_example))
}
