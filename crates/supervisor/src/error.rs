use std::path::PathBuf;

use crate::config::ConfigError;
use crate::process::StopSignal;

/// Conditions that stop the supervisor before the frontend's exit code is
/// known.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start backend '{}': {source}", .program.display())]
    BackendSpawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Backend did not become healthy: {reason}")]
    BackendUnhealthy { reason: String },

    #[error("Failed to start frontend '{}': {source}", .program.display())]
    FrontendSpawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to build health check client: {0}")]
    ProbeClient(#[from] reqwest::Error),

    #[error("Failed to install signal handlers: {0}")]
    SignalHandlers(#[source] std::io::Error),

    #[error("Received {0} before the frontend started")]
    Interrupted(StopSignal),
}

impl SupervisorError {
    /// Process exit code for this failure, following `sysexits.h`.
    pub fn exit_code(&self) -> i32 {
        match self {
            SupervisorError::Config(_) => 78,
            SupervisorError::BackendSpawn { .. } | SupervisorError::FrontendSpawn { .. } => 71,
            SupervisorError::BackendUnhealthy { .. } => 69,
            SupervisorError::ProbeClient(_) | SupervisorError::SignalHandlers(_) => 70,
            SupervisorError::Interrupted(signal) => signal.exit_code(),
        }
    }
}
