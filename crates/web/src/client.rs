//! HTTP client for the calculator backend.
//!
//! Wraps the backend API (`/health`, `/calculate`) using [`reqwest`].

use std::time::Duration;

use abacus_core::calculator::{CalculationRequest, CalculationResponse};
use abacus_core::env_names::HEALTH_PATH;
use serde::Deserialize;

/// Errors from the backend client.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    /// The HTTP request itself failed (connection refused, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Api {
        status: u16,
        /// Machine-readable code from the backend error envelope.
        code: String,
        message: String,
    },
}

/// Error envelope produced by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

/// Client for a single backend instance.
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    /// Create a client for `api_url` (e.g. `http://127.0.0.1:8001`).
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `true` when the backend answers its health endpoint with a 2xx.
    pub async fn health(&self) -> bool {
        match self
            .client
            .get(format!("{}{HEALTH_PATH}", self.api_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, api_url = %self.api_url, "Backend health check failed");
                false
            }
        }
    }

    /// Forward a calculation to `POST /calculate`.
    pub async fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResponse, ApiClientError> {
        let response = self
            .client
            .post(format!("{}/calculate", self.api_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => (parsed.code, parsed.error),
            Err(_) => ("UNKNOWN".to_string(), body),
        };

        Err(ApiClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
