use abacus_core::calculator::CalculationRequest;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::client::ApiClientError;
use crate::page::{render_page, CalculatorForm, Outcome, PageView};
use crate::state::AppState;

/// GET / -- empty calculator.
async fn index(State(state): State<AppState>) -> Html<String> {
    let view = PageView {
        backend_online: state.api.health().await,
        degraded_reason: state.config.degraded_reason.clone(),
        ..Default::default()
    };

    Html(render_page(&view))
}

/// POST /calculate -- forward the form to the backend and render the outcome.
async fn calculate(
    State(state): State<AppState>,
    Form(form): Form<CalculatorForm>,
) -> Html<String> {
    let (outcome, backend_online) = match parse_form(&form) {
        Ok(request) => match state.api.calculate(&request).await {
            Ok(response) => (Outcome::Success(response), true),
            Err(ApiClientError::Api { code, message, .. }) => {
                tracing::debug!(%code, %message, "Backend rejected calculation");
                (Outcome::Error(message), true)
            }
            Err(ApiClientError::Request(e)) => {
                tracing::warn!(error = %e, api_url = %state.api.api_url(), "Backend request failed");
                (
                    Outcome::Error("Cannot connect to API server".to_string()),
                    false,
                )
            }
        },
        Err(message) => (Outcome::Error(message), state.api.health().await),
    };

    let view = PageView {
        backend_online,
        degraded_reason: state.config.degraded_reason.clone(),
        form,
        outcome: Some(outcome),
    };

    Html(render_page(&view))
}

/// Turn raw form fields into a backend request.
///
/// An empty `num2` is sent as absent so unary operations work from the form.
pub fn parse_form(form: &CalculatorForm) -> Result<CalculationRequest, String> {
    let num1: f64 = form
        .num1
        .trim()
        .parse()
        .map_err(|_| "First number must be a number".to_string())?;

    let num2 = match form.num2.trim() {
        "" => None,
        raw => Some(
            raw.parse::<f64>()
                .map_err(|_| "Second number must be a number".to_string())?,
        ),
    };

    Ok(CalculationRequest {
        operation: form.operation.clone(),
        num1,
        num2,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/calculate", post(calculate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(operation: &str, num1: &str, num2: &str) -> CalculatorForm {
        CalculatorForm {
            operation: operation.into(),
            num1: num1.into(),
            num2: num2.into(),
        }
    }

    #[test]
    fn parses_both_operands() {
        let request = parse_form(&form("add", "10", " 5 ")).unwrap();
        assert_eq!(request.operation, "add");
        assert_eq!(request.num1, 10.0);
        assert_eq!(request.num2, Some(5.0));
    }

    #[test]
    fn empty_second_operand_is_absent() {
        let request = parse_form(&form("square_root", "9", "")).unwrap();
        assert_eq!(request.num2, None);
    }

    #[test]
    fn rejects_non_numeric_operands() {
        assert_eq!(
            parse_form(&form("add", "ten", "5")).unwrap_err(),
            "First number must be a number"
        );
        assert_eq!(
            parse_form(&form("add", "1", "five")).unwrap_err(),
            "Second number must be a number"
        );
    }
}
