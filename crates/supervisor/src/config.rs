//! Supervisor configuration.
//!
//! Everything is read through a lookup function so tests can supply a plain
//! map instead of mutating the process environment.
//!
//! | Variable                  | Default                                   |
//! |---------------------------|-------------------------------------------|
//! | `BACKEND_BIN`             | `abacus-api` next to the supervisor binary |
//! | `FRONTEND_BIN`            | `abacus-web` next to the supervisor binary |
//! | `API_HOST`                | `127.0.0.1`                               |
//! | `API_PORT`                | `8001`                                    |
//! | `PORT`                    | `8000`                                    |
//! | `BACKEND_LOG`             | `logs/backend.log`                        |
//! | `STARTUP_GRACE_MS`        | `2000`                                    |
//! | `READINESS_TIMEOUT_MS`    | `30000`                                   |
//! | `HEALTH_CHECK_TIMEOUT_MS` | `2000`                                    |
//! | `BACKEND_FAILURE_POLICY`  | `abort`                                   |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use abacus_core::env_names;

pub const BACKEND_BIN: &str = "BACKEND_BIN";
pub const FRONTEND_BIN: &str = "FRONTEND_BIN";
pub const BACKEND_LOG: &str = "BACKEND_LOG";
pub const STARTUP_GRACE_MS: &str = "STARTUP_GRACE_MS";
pub const READINESS_TIMEOUT_MS: &str = "READINESS_TIMEOUT_MS";
pub const HEALTH_CHECK_TIMEOUT_MS: &str = "HEALTH_CHECK_TIMEOUT_MS";
pub const BACKEND_FAILURE_POLICY: &str = "BACKEND_FAILURE_POLICY";

const DEFAULT_BACKEND_PROGRAM: &str = "abacus-api";
const DEFAULT_FRONTEND_PROGRAM: &str = "abacus-web";
const DEFAULT_BACKEND_LOG: &str = "logs/backend.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Readiness policy
// ---------------------------------------------------------------------------

/// What to do when the backend never becomes ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadinessPolicy {
    /// Terminate the backend and exit non-zero without starting the frontend.
    #[default]
    Abort,
    /// Start the frontend anyway and tell it so via `BACKEND_DEGRADED`.
    Degrade,
}

impl FromStr for ReadinessPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "degrade" => Ok(Self::Degrade),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ReadinessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Degrade => f.write_str("degrade"),
        }
    }
}

// ---------------------------------------------------------------------------
// Readiness timing
// ---------------------------------------------------------------------------

/// Timing of the readiness gate.
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// Fixed wait after spawning the backend, before the first probe.
    pub grace_period: Duration,
    /// Total probing budget, measured from the end of the grace period.
    pub deadline: Duration,
    /// Per-request timeout for a single health probe.
    pub probe_timeout: Duration,
    /// Delay after the first failed probe.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between probes.
    pub max_backoff: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_millis(2_000),
            deadline: Duration::from_millis(30_000),
            probe_timeout: Duration::from_millis(2_000),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub backend_program: PathBuf,
    pub frontend_program: PathBuf,
    /// Loopback host the backend binds to and is probed on.
    pub backend_host: String,
    pub backend_port: u16,
    /// Externally exposed port handed to the frontend.
    pub frontend_port: u16,
    /// File receiving the backend's stdout and stderr.
    pub backend_log: PathBuf,
    /// Directory prepended to the children's `PATH`, normally the directory
    /// holding the supervisor binary.
    pub bin_dir: Option<PathBuf>,
    pub readiness: ReadinessConfig,
    pub policy: ReadinessPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            backend_program: PathBuf::from(DEFAULT_BACKEND_PROGRAM),
            frontend_program: PathBuf::from(DEFAULT_FRONTEND_PROGRAM),
            backend_host: env_names::DEFAULT_API_HOST.to_string(),
            backend_port: env_names::DEFAULT_API_PORT,
            frontend_port: env_names::DEFAULT_PORT,
            backend_log: PathBuf::from(DEFAULT_BACKEND_LOG),
            bin_dir: None,
            readiness: ReadinessConfig::default(),
            policy: ReadinessPolicy::default(),
        }
    }
}

impl SupervisorConfig {
    /// Load from the process environment.
    ///
    /// `bin_dir` is the directory of the running executable, so sibling
    /// binaries from the same build are found without touching `PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bin_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from));

        Self::from_lookup(|key| std::env::var(key).ok(), bin_dir)
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F, bin_dir: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let program = |var: &str, default: &str| -> PathBuf {
            match lookup(var) {
                Some(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
                _ => {
                    let name = format!("{default}{}", std::env::consts::EXE_SUFFIX);
                    match &bin_dir {
                        Some(dir) => dir.join(name),
                        None => PathBuf::from(name),
                    }
                }
            }
        };

        let backend_program = program(BACKEND_BIN, DEFAULT_BACKEND_PROGRAM);
        let frontend_program = program(FRONTEND_BIN, DEFAULT_FRONTEND_PROGRAM);

        let backend_host = lookup(env_names::API_HOST).unwrap_or(defaults.backend_host);
        let backend_port = parse_var(&lookup, env_names::API_PORT, defaults.backend_port, "a port number")?;
        let frontend_port = parse_var(&lookup, env_names::PORT, defaults.frontend_port, "a port number")?;

        let backend_log = lookup(BACKEND_LOG)
            .map(PathBuf::from)
            .unwrap_or(defaults.backend_log);

        let readiness = ReadinessConfig {
            grace_period: parse_millis(&lookup, STARTUP_GRACE_MS, defaults.readiness.grace_period)?,
            deadline: parse_millis(&lookup, READINESS_TIMEOUT_MS, defaults.readiness.deadline)?,
            probe_timeout: parse_millis(
                &lookup,
                HEALTH_CHECK_TIMEOUT_MS,
                defaults.readiness.probe_timeout,
            )?,
            ..defaults.readiness
        };

        let policy = match lookup(BACKEND_FAILURE_POLICY) {
            Some(value) => value.parse().map_err(|()| ConfigError::Invalid {
                var: BACKEND_FAILURE_POLICY,
                value,
                expected: "'abort' or 'degrade'",
            })?,
            None => defaults.policy,
        };

        Ok(Self {
            backend_program,
            frontend_program,
            backend_host,
            backend_port,
            frontend_port,
            backend_log,
            bin_dir,
            readiness,
            policy,
        })
    }

    /// Base URL of the backend, e.g. `http://127.0.0.1:8001`.
    pub fn backend_url(&self) -> String {
        format!("http://{}:{}", self.backend_host, self.backend_port)
    }

    /// Full URL of the backend liveness endpoint.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.backend_url(), env_names::HEALTH_PATH)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected,
        }),
        None => Ok(default),
    }
}

fn parse_millis<F>(lookup: &F, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let millis = parse_var(
        lookup,
        var,
        default.as_millis() as u64,
        "a whole number of milliseconds",
    )?;
    Ok(Duration::from_millis(millis))
}
