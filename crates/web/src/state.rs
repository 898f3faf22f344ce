use std::sync::Arc;

use crate::client::ApiClient;
use crate::config::WebConfig;

/// Shared state available to all handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebConfig>,
    /// Backend client; pooled connections are reused across requests.
    pub api: Arc<ApiClient>,
}
