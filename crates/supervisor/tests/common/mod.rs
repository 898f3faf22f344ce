#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use abacus_supervisor::config::{ReadinessConfig, ReadinessPolicy, SupervisorConfig};
use abacus_supervisor::environment::LaunchEnv;
use abacus_supervisor::process::{BackgroundProcess, LaunchSpec, ProcessLauncher, Role};
use abacus_supervisor::readiness::{ProbeOutcome, ReadinessProbe};
use abacus_supervisor::Supervisor;

/// An address nothing listens on.
pub const UNREACHABLE_HEALTH_URL: &str = "http://127.0.0.1:1/health";

/// One recorded launch.
#[derive(Debug, Clone)]
pub struct Launch {
    pub role: Role,
    pub program: PathBuf,
    pub env: LaunchEnv,
}

/// Records every launch instead of starting processes.
#[derive(Default)]
pub struct RecordingLauncher {
    launches: Mutex<Vec<Launch>>,
    pub fail_backend: bool,
    pub fail_frontend: bool,
    pub frontend_exit_code: i32,
}

impl RecordingLauncher {
    pub fn exiting_with(code: i32) -> Self {
        Self {
            frontend_exit_code: code,
            ..Default::default()
        }
    }

    pub fn failing_backend() -> Self {
        Self {
            fail_backend: true,
            ..Default::default()
        }
    }

    pub fn failing_frontend() -> Self {
        Self {
            fail_frontend: true,
            ..Default::default()
        }
    }

    pub fn launches(&self) -> Vec<Launch> {
        self.launches.lock().unwrap().clone()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.launches().into_iter().map(|l| l.role).collect()
    }

    /// Environment the frontend was started with, if it was started.
    pub fn frontend_env(&self) -> Option<LaunchEnv> {
        self.launches()
            .into_iter()
            .find(|l| l.role == Role::Frontend)
            .map(|l| l.env)
    }

    fn record(&self, spec: &LaunchSpec) {
        self.launches.lock().unwrap().push(Launch {
            role: spec.role,
            program: spec.program.clone(),
            env: spec.env.clone(),
        });
    }
}

#[async_trait]
impl ProcessLauncher for RecordingLauncher {
    fn spawn_background(&self, spec: &LaunchSpec) -> io::Result<BackgroundProcess> {
        if self.fail_backend {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }
        self.record(spec);
        Ok(BackgroundProcess::detached(Some(4242), spec.log_path.clone()))
    }

    async fn run_foreground(&self, spec: &LaunchSpec) -> io::Result<i32> {
        if self.fail_frontend {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }
        self.record(spec);
        Ok(self.frontend_exit_code)
    }
}

/// Always reports the same outcome.
pub struct FixedProbe(pub ProbeOutcome);

impl FixedProbe {
    pub fn healthy() -> Self {
        Self(ProbeOutcome::Healthy)
    }

    pub fn refused() -> Self {
        Self(ProbeOutcome::Unhealthy("connection refused".into()))
    }
}

#[async_trait]
impl ReadinessProbe for FixedProbe {
    async fn probe(&self) -> ProbeOutcome {
        self.0.clone()
    }

    fn target(&self) -> &str {
        "fixed"
    }
}

/// Readiness timing short enough for tests.
pub fn fast_readiness() -> ReadinessConfig {
    ReadinessConfig {
        grace_period: Duration::ZERO,
        deadline: Duration::from_millis(50),
        probe_timeout: Duration::from_millis(200),
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(10),
        multiplier: 2.0,
    }
}

pub fn test_config(policy: ReadinessPolicy) -> SupervisorConfig {
    SupervisorConfig {
        readiness: fast_readiness(),
        policy,
        ..Default::default()
    }
}

pub fn ambient() -> BTreeMap<String, String> {
    [("PATH", "/usr/bin:/bin"), ("LANG", "C.UTF-8")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn build_supervisor<P: ReadinessProbe>(
    policy: ReadinessPolicy,
    launcher: RecordingLauncher,
    probe: P,
) -> Supervisor<RecordingLauncher, P> {
    Supervisor::new(test_config(policy), launcher, probe)
}

/// Serve the real backend router on an ephemeral loopback port and return
/// the port.
pub async fn spawn_backend() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = abacus_api::routes::app(&abacus_api::config::ServerConfig::default());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    port
}
