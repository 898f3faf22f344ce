//! Child process launching.
//!
//! [`ProcessLauncher`] is the seam between the supervisor's sequencing and
//! the OS: [`OsLauncher`] spawns real processes via `tokio::process`, tests
//! substitute a recording launcher.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::environment::LaunchEnv;

/// How long a terminated child gets to exit before it is killed.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Only this much of the end of a log sink is read back.
const LOG_TAIL_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Backend,
    Frontend,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Backend => f.write_str("backend"),
            Role::Frontend => f.write_str("frontend"),
        }
    }
}

/// Everything needed to start one child.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub role: Role,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Complete environment; nothing else is inherited.
    pub env: LaunchEnv,
    /// Output sink for background children. Ignored in the foreground.
    pub log_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Background process handle
// ---------------------------------------------------------------------------

/// Handle to a detached background child.
pub struct BackgroundProcess {
    pid: Option<u32>,
    log_path: Option<PathBuf>,
    /// `None` when the launcher does not own an OS child.
    child: Option<Child>,
}

impl BackgroundProcess {
    pub fn from_child(child: Child, log_path: Option<PathBuf>) -> Self {
        Self {
            pid: child.id(),
            log_path,
            child: Some(child),
        }
    }

    /// A handle with no OS child behind it; it never reports an exit.
    pub fn detached(pid: Option<u32>, log_path: Option<PathBuf>) -> Self {
        Self {
            pid,
            log_path,
            child: None,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Exit code if the child has already exited, without blocking.
    pub fn exit_code(&mut self) -> Option<i32> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => Some(exit_code_of(status)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(pid = ?self.pid, error = %e, "Failed to poll background process");
                None
            }
        }
    }

    /// Last `max_lines` lines of the output sink, for post-mortem logging.
    ///
    /// Only the end of the file is read; invalid UTF-8 is replaced.
    pub fn log_tail(&self, max_lines: usize) -> Vec<String> {
        let Some(path) = &self.log_path else {
            return Vec::new();
        };

        match read_tail(path, LOG_TAIL_BYTES) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let lines: Vec<&str> = text.lines().collect();
                let start = lines.len().saturating_sub(max_lines);
                lines[start..].iter().map(|l| l.to_string()).collect()
            }
            Err(e) => {
                tracing::debug!(log = %path.display(), error = %e, "Cannot read background log");
                Vec::new()
            }
        }
    }

    /// Ask the child to stop (SIGTERM on Unix), killing it if it is still
    /// running after `grace`.
    pub async fn terminate(&mut self, grace: Duration) {
        let Some(child) = self.child.as_mut() else {
            return;
        };

        if let Ok(Some(status)) = child.try_wait() {
            tracing::debug!(pid = ?self.pid, code = exit_code_of(status), "Background process already exited");
            return;
        }

        request_stop(child);

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(pid = ?self.pid, code = exit_code_of(status), "Background process stopped");
            }
            Ok(Err(e)) => {
                tracing::warn!(pid = ?self.pid, error = %e, "Failed to wait for background process");
            }
            Err(_) => {
                tracing::warn!(
                    pid = ?self.pid,
                    grace_ms = grace.as_millis() as u64,
                    "Background process ignored termination, killing",
                );
                if let Err(e) = child.kill().await {
                    tracing::error!(pid = ?self.pid, error = %e, "Failed to kill background process");
                }
            }
        }
    }
}

impl fmt::Debug for BackgroundProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundProcess")
            .field("pid", &self.pid)
            .field("log_path", &self.log_path)
            .field("owned", &self.child.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Launcher seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start a detached child and return immediately.
    fn spawn_background(&self, spec: &LaunchSpec) -> std::io::Result<BackgroundProcess>;

    /// Start a child attached to our standard streams and wait for it.
    ///
    /// Resolves to the child's exit code. An `Err` means the child could not
    /// be started (or waited on) at all.
    async fn run_foreground(&self, spec: &LaunchSpec) -> std::io::Result<i32>;
}

/// Launches real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsLauncher;

#[async_trait]
impl ProcessLauncher for OsLauncher {
    fn spawn_background(&self, spec: &LaunchSpec) -> std::io::Result<BackgroundProcess> {
        let mut command = base_command(spec);
        command.stdin(Stdio::null());

        match &spec.log_path {
            Some(path) => {
                let sink = open_log_sink(path)?;
                command.stdout(Stdio::from(sink.try_clone()?));
                command.stderr(Stdio::from(sink));
            }
            None => {
                command.stdout(Stdio::null());
                command.stderr(Stdio::null());
            }
        }

        let child = command.spawn()?;

        tracing::info!(
            role = %spec.role,
            program = %spec.program.display(),
            pid = ?child.id(),
            log = ?spec.log_path,
            "Spawned background process",
        );

        Ok(BackgroundProcess::from_child(child, spec.log_path.clone()))
    }

    async fn run_foreground(&self, spec: &LaunchSpec) -> std::io::Result<i32> {
        let mut signals = ShutdownSignals::install()?;

        let mut command = base_command(spec);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn()?;

        tracing::info!(
            role = %spec.role,
            program = %spec.program.display(),
            pid = ?child.id(),
            "Spawned foreground process",
        );

        let status = wait_forwarding_signals(&mut child, &mut signals).await?;
        Ok(exit_code_of(status))
    }
}

fn base_command(spec: &LaunchSpec) -> Command {
    let mut command = Command::new(&spec.program);
    command.args(&spec.args).env_clear().envs(spec.env.iter());
    command
}

/// Open (appending) the output sink, creating its directory if needed.
fn open_log_sink(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

// ---------------------------------------------------------------------------
// Stop signals
// ---------------------------------------------------------------------------

/// A stop request received by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

impl StopSignal {
    /// Shell convention for a process ended by this signal.
    pub fn exit_code(self) -> i32 {
        match self {
            StopSignal::Interrupt => 128 + 2,
            StopSignal::Terminate => 128 + 15,
        }
    }
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopSignal::Interrupt => f.write_str("SIGINT"),
            StopSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// SIGINT/SIGTERM listeners.
///
/// While one is alive the default disposition (immediate exit) is replaced,
/// so the supervisor can clean up its children first.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next stop request.
    pub async fn recv(&mut self) -> StopSignal {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => StopSignal::Interrupt,
                _ = self.terminate.recv() => StopSignal::Terminate,
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            StopSignal::Interrupt
        }
    }
}

/// Wait for `child`, relaying stop requests received by the supervisor so
/// the child can shut down gracefully and its exit code still propagates.
async fn wait_forwarding_signals(
    child: &mut Child,
    signals: &mut ShutdownSignals,
) -> std::io::Result<ExitStatus> {
    loop {
        tokio::select! {
            status = child.wait() => return status,
            signal = signals.recv() => {
                tracing::info!(%signal, "Forwarding stop request to foreground process");
            }
        }

        request_stop(child);
    }
}

/// Graceful stop request: SIGTERM on Unix, kill elsewhere.
fn request_stop(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: kill(2) has no memory-safety preconditions.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                tracing::warn!(
                    pid,
                    error = %std::io::Error::last_os_error(),
                    "Failed to send SIGTERM",
                );
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = child.start_kill() {
            tracing::warn!(error = %e, "Failed to stop child process");
        }
    }
}

/// Exit code of a finished child; death by signal maps to `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Read at most the last `max_bytes` of `path`.
///
/// When the file is longer, the partial first line is dropped.
fn read_tail(path: &Path, max_bytes: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let start = len.saturating_sub(max_bytes);
    file.seek(SeekFrom::Start(start))?;

    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    if start > 0 {
        if let Some(newline) = buf.iter().position(|&b| b == b'\n') {
            buf.drain(..=newline);
        }
    }
    Ok(buf)
}
