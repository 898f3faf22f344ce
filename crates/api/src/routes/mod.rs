use std::time::Duration;

use axum::http::{HeaderName, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::handle_panic;

pub mod calculator;
pub mod health;

/// Build the full application router with its middleware stack.
///
/// Shared by `main.rs` and the integration tests so both exercise the same
/// layers (request ID, timeout, tracing, panic recovery).
pub fn app(config: &ServerConfig) -> Router {
    with_middleware(
        Router::new()
            .merge(health::router())
            .merge(calculator::router()),
        config,
    )
}

/// Wrap `router` in the service middleware stack.
pub fn with_middleware(router: Router, config: &ServerConfig) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    router
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
}
