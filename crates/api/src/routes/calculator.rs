use abacus_core::calculator::{CalculationRequest, CalculationResponse, Operation};
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::AppResult;

/// Supported operation names.
#[derive(Serialize)]
pub struct OperationsResponse {
    pub operations: Vec<&'static str>,
}

/// POST /calculate -- evaluate one operation.
///
/// Malformed bodies are reported through the same `{ error, code }` envelope
/// as calculator errors rather than axum's plain-text rejection.
async fn calculate(
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> AppResult<Json<CalculationResponse>> {
    let Json(request) = payload?;
    let response = request.evaluate()?;

    tracing::debug!(
        operation = %response.operation,
        num1 = response.num1,
        num2 = ?response.num2,
        result = response.result,
        "Calculation evaluated",
    );

    Ok(Json(response))
}

/// GET /operations -- list the supported selectors.
async fn list_operations() -> Json<OperationsResponse> {
    Json(OperationsResponse {
        operations: Operation::ALL.iter().map(|op| op.as_str()).collect(),
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/operations", get(list_operations))
}
