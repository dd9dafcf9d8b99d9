use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use isdb_core::config::HealthStatus;

use crate::state::AppState;

/// GET /api/system/health
///
/// Configuration health. `unhealthy` answers 503; `degraded` is still 200.
pub async fn system_health(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.config_manager.health_check();
    let status = match health.overall_status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(health))
}
