//! Tests for `AppError` → HTTP response mapping.
//!
//! Most of these call `IntoResponse` directly on `AppError` values; the
//! panic test goes through the service middleware stack.

use abacus_api::error::AppError;
use abacus_core::calculator::Operation;
use abacus_core::error::CoreError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn calculator_errors_map_to_400_with_distinct_codes() {
    let cases = [
        (CoreError::UnknownOperation("mod".into()), "UNKNOWN_OPERATION"),
        (CoreError::DivisionByZero, "DIVISION_BY_ZERO"),
        (CoreError::NegativeSquareRoot, "NEGATIVE_SQUARE_ROOT"),
        (CoreError::MissingOperand(Operation::Add), "MISSING_OPERAND"),
        (CoreError::NonFiniteResult(Operation::Power), "NON_FINITE_RESULT"),
    ];

    for (err, expected_code) in cases {
        let message = err.to_string();
        let (status, json) = error_to_response(AppError::Core(err)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], expected_code);
        assert_eq!(json["error"], message);
    }
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid field value");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret stack trace".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(
        !json.to_string().contains("secret"),
        "Internal error response must not leak details"
    );
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: a panicking handler is caught and rendered as the JSON envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn handler_panic_returns_internal_error_envelope() {
    use abacus_api::config::ServerConfig;
    use abacus_api::routes::with_middleware;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("secret invariant broken")
    }

    let app = with_middleware(
        Router::new().route("/explode", get(explode)),
        &ServerConfig::default(),
    );

    let response = app
        .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
    assert!(!json.to_string().contains("secret"));
}
