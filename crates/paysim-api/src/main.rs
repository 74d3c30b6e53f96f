//! paysim payment API
//!
//! Simulated payment endpoints instrumented with Prometheus metrics:
//! - `GET/POST /api/payments`, `GET /api/transactions`
//! - `GET /metrics` scrape, `GET /health` liveness

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paysim_api::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "paysim-api failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> paysim_core::Result<()> {
    let path = config::resolve_path(std::env::args().nth(1), std::env::var("PAYSIM_CONFIG").ok());
    let cfg = config::load(path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| paysim_core::PaysimError::BadRequest(format!("server.listen: {e}")))?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| paysim_core::PaysimError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, "paysim-api starting");
    for (name, path) in [
        ("health", "/health"),
        ("payments", "/api/payments"),
        ("transactions", "/api/transactions"),
        ("metrics", "/metrics"),
    ] {
        tracing::info!(endpoint = name, url = %format!("http://{listen}{path}"), "endpoint");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| paysim_core::PaysimError::Internal(format!("server failed: {e}")))?;
    tracing::info!("paysim-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
