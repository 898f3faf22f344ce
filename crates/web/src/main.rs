//! `abacus-web` -- calculator frontend.
//!
//! Binds the externally exposed `PORT` and talks to the backend at
//! `API_URL`. Normally launched in the foreground by `abacus-supervisor`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abacus_web::client::ApiClient;
use abacus_web::config::WebConfig;
use abacus_web::routes;
use abacus_web::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abacus_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WebConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        api_url = %config.api_url,
        degraded = config.degraded_reason.is_some(),
        "Loaded frontend configuration",
    );

    if let Some(reason) = &config.degraded_reason {
        tracing::warn!(%reason, "Starting in degraded mode");
    }

    let api = ApiClient::new(
        &config.api_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .expect("Failed to build backend HTTP client");

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );

    let state = AppState {
        config: Arc::new(config),
        api: Arc::new(api),
    };

    let app = routes::app(state);

    tracing::info!(%addr, "Starting calculator frontend");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Calculator frontend stopped");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
