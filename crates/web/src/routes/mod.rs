use std::any::Any;
use std::time::Duration;

use axum::http::{HeaderName, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::page::{render_page, Outcome, PageView};
use crate::state::AppState;

pub mod calculator;
pub mod health;

/// Build the frontend router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let request_timeout_secs = state.config.request_timeout_secs;

    with_middleware(
        Router::new()
            .merge(calculator::router())
            .merge(health::router())
            .with_state(state),
        request_timeout_secs,
    )
}

/// Wrap `router` in the frontend middleware stack.
pub fn with_middleware(router: Router, request_timeout_secs: u64) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    // Leave room for a full backend round trip inside one inbound request.
    let timeout = Duration::from_secs(request_timeout_secs.saturating_mul(2));

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
}

/// Render a caught handler panic as the calculator page with a generic error.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "non-string panic payload"
    };
    tracing::error!(%detail, "Handler panicked");

    let view = PageView {
        outcome: Some(Outcome::Error("An internal error occurred".to_string())),
        ..Default::default()
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Html(render_page(&view))).into_response()
}
