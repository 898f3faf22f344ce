use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process can answer requests.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// RFC 3339 UTC timestamp of the check.
    pub timestamp: String,
}

/// Service banner returned at `/`.
#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health -- liveness probe polled by the supervisor.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET / -- service banner.
async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Abacus Calculator API",
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Mount the banner and health check routes.
pub fn router() -> Router {
    Router::new()
        .route("/", get(service_info))
        .route(abacus_core::env_names::HEALTH_PATH, get(health_check))
}
