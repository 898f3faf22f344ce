//! Well-known environment variable names.
//!
//! The supervisor produces these and the backend/frontend binaries consume
//! them, so all three must agree on the spelling.

/// Base URL of the backend API, e.g. `http://127.0.0.1:8001`.
///
/// Produced by the supervisor, consumed by the frontend.
pub const API_URL: &str = "API_URL";

/// Loopback host the backend binds to.
pub const API_HOST: &str = "API_HOST";

/// Port the backend binds to.
pub const API_PORT: &str = "API_PORT";

/// Externally exposed port, bound by the frontend.
pub const PORT: &str = "PORT";

/// Bind host for the frontend.
pub const HOST: &str = "HOST";

/// Executable search path, extended by the supervisor.
pub const PATH: &str = "PATH";

/// Set to `1` when the frontend is started without a healthy backend.
pub const BACKEND_DEGRADED: &str = "BACKEND_DEGRADED";

/// Human-readable reason accompanying [`BACKEND_DEGRADED`].
pub const BACKEND_DEGRADED_REASON: &str = "BACKEND_DEGRADED_REASON";

/// Per-request timeout for the HTTP services, in seconds.
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

/// Default backend port on the loopback interface.
pub const DEFAULT_API_PORT: u16 = 8001;

/// Default loopback host for the backend.
pub const DEFAULT_API_HOST: &str = "127.0.0.1";

/// Default externally exposed port.
pub const DEFAULT_PORT: u16 = 8000;

/// Path of the backend liveness endpoint.
pub const HEALTH_PATH: &str = "/health";
