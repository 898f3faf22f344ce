//! Backend readiness gate.
//!
//! After a fixed grace period the backend's health endpoint is probed with
//! exponential backoff until it answers or the deadline passes. The outcome
//! is a typed [`Readiness`] verdict; what a timeout means is decided by the
//! configured [`ReadinessPolicy`], never by chance.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::config::{ReadinessConfig, ReadinessPolicy};
use crate::process::BackgroundProcess;

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy(String),
}

/// Verdict of the readiness gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Ready { attempts: u32, elapsed: Duration },
    Degraded { reason: String },
    Failed { reason: String },
}

#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Issue one health check.
    async fn probe(&self) -> ProbeOutcome;

    /// What is being probed, for logs.
    fn target(&self) -> &str;
}

/// Probes `GET <url>` and treats any 2xx as healthy.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn probe(&self) -> ProbeOutcome {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Healthy,
            Ok(response) => ProbeOutcome::Unhealthy(format!("HTTP {}", response.status())),
            Err(e) => ProbeOutcome::Unhealthy(e.to_string()),
        }
    }

    fn target(&self) -> &str {
        &self.url
    }
}

/// Calculate the next backoff delay, clamped to `max_backoff`.
pub fn next_delay(current: Duration, config: &ReadinessConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_backoff)
}

/// Map a readiness failure onto the configured policy.
pub fn apply_policy(policy: ReadinessPolicy, reason: String) -> Readiness {
    match policy {
        ReadinessPolicy::Abort => Readiness::Failed { reason },
        ReadinessPolicy::Degrade => Readiness::Degraded { reason },
    }
}

/// Wait for the backend to answer its health check.
///
/// Sleeps `grace_period`, then probes until healthy or `deadline` has
/// elapsed (a final probe is made at the deadline). Stops early if the
/// backend process has exited.
pub async fn await_backend_ready<P>(
    probe: &P,
    backend: &mut BackgroundProcess,
    config: &ReadinessConfig,
    policy: ReadinessPolicy,
) -> Readiness
where
    P: ReadinessProbe + ?Sized,
{
    tracing::info!(
        target_url = probe.target(),
        grace_ms = config.grace_period.as_millis() as u64,
        deadline_ms = config.deadline.as_millis() as u64,
        %policy,
        "Waiting for backend readiness",
    );
    tokio::time::sleep(config.grace_period).await;

    let start = Instant::now();
    let mut delay = config.initial_backoff;
    let mut attempt = 0u32;

    let reason = loop {
        attempt += 1;

        if let Some(code) = backend.exit_code() {
            break format!("backend process exited with code {code} before becoming ready");
        }

        let last_error = match probe.probe().await {
            ProbeOutcome::Healthy => {
                let elapsed = start.elapsed();
                tracing::info!(
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backend is ready",
                );
                return Readiness::Ready {
                    attempts: attempt,
                    elapsed,
                };
            }
            ProbeOutcome::Unhealthy(reason) => {
                tracing::warn!(attempt, %reason, "Backend health check failed");
                reason
            }
        };

        let elapsed = start.elapsed();
        if elapsed >= config.deadline {
            break format!(
                "backend not ready after {attempt} health checks over {}ms: {last_error}",
                elapsed.as_millis()
            );
        }

        tokio::time::sleep(delay.min(config.deadline - elapsed)).await;
        delay = next_delay(delay, config);
    };

    apply_policy(policy, reason)
}
