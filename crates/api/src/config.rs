use abacus_core::env_names;

/// Server configuration loaded from environment variables.
///
/// Defaults keep the API on the loopback interface; the supervisor sets
/// `API_HOST` / `API_PORT` explicitly when it launches this process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `8001`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env_names::DEFAULT_API_HOST.to_string(),
            port: env_names::DEFAULT_API_PORT,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `API_HOST`             | `127.0.0.1` |
    /// | `API_PORT`             | `8001`      |
    /// | `REQUEST_TIMEOUT_SECS` | `30`        |
    ///
    /// Panics on unparsable values: misconfiguration should stop the
    /// process before it binds.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var(env_names::API_HOST).unwrap_or(defaults.host);

        let port: u16 = std::env::var(env_names::API_PORT)
            .map(|v| v.parse().expect("API_PORT must be a valid u16"))
            .unwrap_or(defaults.port);

        let request_timeout_secs: u64 = std::env::var(env_names::REQUEST_TIMEOUT_SECS)
            .map(|v| {
                v.parse()
                    .expect("REQUEST_TIMEOUT_SECS must be a valid u64")
            })
            .unwrap_or(defaults.request_timeout_secs);

        Self {
            host,
            port,
            request_timeout_secs,
        }
    }
}
