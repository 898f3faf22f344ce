use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Frontend health payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"` when the backend answers and we were not started degraded.
    pub status: &'static str,
    pub backend_reachable: bool,
    pub degraded_mode: bool,
}

/// GET /health -- frontend status including the backend's reachability.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend_reachable = state.api.health().await;
    let degraded_mode = state.config.degraded_reason.is_some();

    let status = if backend_reachable && !degraded_mode {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        backend_reachable,
        degraded_mode,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
