//! Stop requests arriving before the frontend starts.
//!
//! Kept in its own test binary: the signal is sent to this whole process.
#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use assert_matches::assert_matches;

use abacus_supervisor::config::{ReadinessConfig, ReadinessPolicy, SupervisorConfig};
use abacus_supervisor::error::SupervisorError;
use abacus_supervisor::process::{OsLauncher, StopSignal};
use abacus_supervisor::Supervisor;
use common::{ambient, fast_readiness, FixedProbe};

fn write_script(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn sigterm_during_grace_period_stops_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backend_log = dir.path().join("backend.log");
    let frontend_marker = dir.path().join("frontend.ran");
    let config = SupervisorConfig {
        backend_program: write_script(
            dir.path(),
            "backend",
            "trap 'echo stopped; exit 0' TERM\necho started\nwhile :; do sleep 0.05; done",
        ),
        frontend_program: write_script(
            dir.path(),
            "frontend",
            &format!("echo ran > '{}'", frontend_marker.display()),
        ),
        backend_log: backend_log.clone(),
        readiness: ReadinessConfig {
            grace_period: Duration::from_secs(10),
            ..fast_readiness()
        },
        policy: ReadinessPolicy::Abort,
        ..Default::default()
    };
    let supervisor = Supervisor::new(config, OsLauncher, FixedProbe::healthy());

    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        // SAFETY: kill(2) has no memory-safety preconditions.
        unsafe {
            libc::kill(libc::getpid(), libc::SIGTERM);
        }
    });

    let err = supervisor.run(&ambient()).await.unwrap_err();

    assert_matches!(err, SupervisorError::Interrupted(StopSignal::Terminate));
    assert_eq!(err.exit_code(), 143);
    assert!(!frontend_marker.exists(), "frontend must not be started");
    let log = std::fs::read_to_string(&backend_log).unwrap();
    assert!(log.contains("stopped"), "backend log: {log}");
}
