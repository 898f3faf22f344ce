//! `abacus-supervisor` -- single entrypoint for the calculator deployment.
//!
//! Takes no arguments. Starts `abacus-api` on loopback, waits for it to
//! report healthy, then runs `abacus-web` on the exposed port and exits with
//! its exit code.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abacus_supervisor::config::SupervisorConfig;
use abacus_supervisor::environment::ambient_environment;
use abacus_supervisor::error::SupervisorError;
use abacus_supervisor::process::OsLauncher;
use abacus_supervisor::readiness::HttpProbe;
use abacus_supervisor::Supervisor;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abacus_supervisor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, code = e.exit_code(), "Supervisor failed");
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run() -> Result<i32, SupervisorError> {
    let config = SupervisorConfig::from_env()?;
    tracing::info!(
        backend_url = %config.backend_url(),
        frontend_port = config.frontend_port,
        policy = %config.policy,
        "Loaded supervisor configuration",
    );

    let probe = HttpProbe::new(config.health_url(), config.readiness.probe_timeout)?;
    let supervisor = Supervisor::new(config, OsLauncher, probe);

    supervisor.run(&ambient_environment()).await
}
