/// Earthquake dashboard entry point
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod logging;
mod routes;
mod services;
mod utils;

use crate::clients::UsgsClient;
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::logging::{init_tracing, TracingEventLog};
use crate::routes::build_router;
use crate::services::EarthquakeService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first: it decides where the log files go
    let config = AppConfig::from_env()?;
    init_tracing(&config.logs)?;
    info!(
        "Configuration loaded: upstream {}, {} locations, dashboard log in {}",
        config.usgs_api_url,
        config.locations.all().len(),
        config.logs.dashboard_dir.display()
    );

    let client = UsgsClient::new(config.usgs_api_url.clone(), &config.user_agent)?;

    let state = AppState {
        earthquakes: Arc::new(EarthquakeService::new(client)),
        locations: Arc::new(config.locations.clone()),
        event_log: Arc::new(TracingEventLog),
        started_at: Instant::now(),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("quake_dashboard listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
