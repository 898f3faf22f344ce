//! Startup sequencing.
//!
//! Order is fixed: build the environment, spawn the backend detached, gate on
//! its health endpoint, then run the frontend in the foreground. The backend
//! is always spawned strictly before the frontend, and the frontend never
//! starts without `API_URL` in its environment.

use std::collections::BTreeMap;

use crate::config::SupervisorConfig;
use crate::environment::{self, LaunchEnv};
use crate::error::SupervisorError;
use crate::process::{
    BackgroundProcess, LaunchSpec, ProcessLauncher, Role, ShutdownSignals, TERMINATE_GRACE,
};
use crate::readiness::{self, Readiness, ReadinessProbe};

/// Backend log lines echoed when startup is aborted.
const LOG_TAIL_LINES: usize = 20;

pub struct Supervisor<L, P> {
    config: SupervisorConfig,
    launcher: L,
    probe: P,
}

impl<L, P> Supervisor<L, P>
where
    L: ProcessLauncher,
    P: ReadinessProbe,
{
    pub fn new(config: SupervisorConfig, launcher: L, probe: P) -> Self {
        Self {
            config,
            launcher,
            probe,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Build the environment inherited by both children.
    pub fn configure_environment(&self, ambient: &BTreeMap<String, String>) -> LaunchEnv {
        environment::configure_environment(ambient, &self.config)
    }

    /// Spawn the backend detached, its output going to the backend log.
    pub fn launch_backend(&self, env: &LaunchEnv) -> Result<BackgroundProcess, SupervisorError> {
        let spec = LaunchSpec {
            role: Role::Backend,
            program: self.config.backend_program.clone(),
            args: Vec::new(),
            env: env.clone(),
            log_path: Some(self.config.backend_log.clone()),
        };

        self.launcher
            .spawn_background(&spec)
            .map_err(|source| SupervisorError::BackendSpawn {
                program: spec.program,
                source,
            })
    }

    /// Gate on the backend's health endpoint under the configured policy.
    pub async fn await_backend_ready(&self, backend: &mut BackgroundProcess) -> Readiness {
        readiness::await_backend_ready(
            &self.probe,
            backend,
            &self.config.readiness,
            self.config.policy,
        )
        .await
    }

    /// Run the frontend attached to our standard streams until it exits.
    ///
    /// Returns the frontend's exit code.
    pub async fn launch_frontend_foreground(&self, env: &LaunchEnv) -> Result<i32, SupervisorError> {
        let spec = LaunchSpec {
            role: Role::Frontend,
            program: self.config.frontend_program.clone(),
            args: Vec::new(),
            env: env.clone(),
            log_path: None,
        };

        self.launcher
            .run_foreground(&spec)
            .await
            .map_err(|source| SupervisorError::FrontendSpawn {
                program: spec.program,
                source,
            })
    }

    /// Full startup sequence. Resolves to the exit code the supervisor
    /// should terminate with.
    ///
    /// A SIGINT/SIGTERM before the frontend starts stops the backend and
    /// ends the run with [`SupervisorError::Interrupted`].
    pub async fn run(&self, ambient: &BTreeMap<String, String>) -> Result<i32, SupervisorError> {
        let mut signals = ShutdownSignals::install().map_err(SupervisorError::SignalHandlers)?;

        let env = self.configure_environment(ambient);
        tracing::info!(
            api_url = env.get(abacus_core::env_names::API_URL),
            backend = %self.config.backend_program.display(),
            frontend = %self.config.frontend_program.display(),
            "Starting services",
        );

        let mut backend = self.launch_backend(&env)?;

        let verdict = tokio::select! {
            verdict = self.await_backend_ready(&mut backend) => verdict,
            signal = signals.recv() => {
                tracing::warn!(%signal, "Stop requested during startup, stopping backend");
                backend.terminate(TERMINATE_GRACE).await;
                return Err(SupervisorError::Interrupted(signal));
            }
        };

        let frontend_env = match verdict {
            Readiness::Ready { attempts, elapsed } => {
                tracing::info!(
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backend healthy, starting frontend",
                );
                env
            }
            Readiness::Degraded { reason } => {
                tracing::warn!(%reason, "Backend unavailable, starting frontend in degraded mode");
                env.with_degraded(&reason)
            }
            Readiness::Failed { reason } => {
                tracing::error!(%reason, "Backend failed readiness check, aborting startup");
                log_backend_tail(&backend);
                backend.terminate(TERMINATE_GRACE).await;
                return Err(SupervisorError::BackendUnhealthy { reason });
            }
        };

        let result = self.launch_frontend_foreground(&frontend_env).await;

        match &result {
            Ok(code) => tracing::info!(code, "Frontend exited"),
            Err(e) => tracing::error!(error = %e, "Frontend could not be run"),
        }

        backend.terminate(TERMINATE_GRACE).await;
        result
    }
}

fn log_backend_tail(backend: &BackgroundProcess) {
    let tail = backend.log_tail(LOG_TAIL_LINES);
    if tail.is_empty() {
        return;
    }

    let log = backend
        .log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    for line in tail {
        tracing::error!(log = %log, "backend: {line}");
    }
}
