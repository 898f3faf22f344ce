use abacus_core::env_names;

/// Frontend configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Externally exposed port (default: `8000`).
    pub port: u16,
    /// Backend base URL (default: `http://127.0.0.1:8001`).
    pub api_url: String,
    /// Timeout for inbound requests and for calls to the backend, in seconds.
    pub request_timeout_secs: u64,
    /// `Some(reason)` when the supervisor started us without a healthy backend.
    pub degraded_reason: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: env_names::DEFAULT_PORT,
            api_url: format!(
                "http://{}:{}",
                env_names::DEFAULT_API_HOST,
                env_names::DEFAULT_API_PORT
            ),
            request_timeout_secs: 30,
            degraded_reason: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `8000`                  |
    /// | `API_URL`                 | `http://127.0.0.1:8001` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `BACKEND_DEGRADED`        | unset                   |
    /// | `BACKEND_DEGRADED_REASON` | unset                   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var(env_names::HOST).unwrap_or(defaults.host);

        let port: u16 = std::env::var(env_names::PORT)
            .map(|v| v.parse().expect("PORT must be a valid u16"))
            .unwrap_or(defaults.port);

        let api_url = std::env::var(env_names::API_URL).unwrap_or(defaults.api_url);

        let request_timeout_secs: u64 = std::env::var(env_names::REQUEST_TIMEOUT_SECS)
            .map(|v| {
                v.parse()
                    .expect("REQUEST_TIMEOUT_SECS must be a valid u64")
            })
            .unwrap_or(defaults.request_timeout_secs);

        let degraded_reason = std::env::var(env_names::BACKEND_DEGRADED)
            .ok()
            .filter(|v| v == "1")
            .map(|_| {
                std::env::var(env_names::BACKEND_DEGRADED_REASON)
                    .unwrap_or_else(|_| "backend was not ready at startup".to_string())
            });

        Self {
            host,
            port,
            api_url,
            request_timeout_secs,
            degraded_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timeout_default_matches_backend() {
        assert_eq!(
            WebConfig::default().request_timeout_secs,
            abacus_api::config::ServerConfig::default().request_timeout_secs
        );
    }
}
