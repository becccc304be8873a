// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::wtp_service::WtpService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::sensor_api_client::SensorApiClient;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create data source (infrastructure layer)
    let source = Arc::new(SensorApiClient::new(&config.backend_base_url));
    tracing::info!("Using backend {}", source.base_url());

    // Create services (application layer)
    let dashboard_service = DashboardService::new(source, config.dashboard_poll_interval());
    let wtp_service = WtpService::new(config.kpi_poll_interval());

    dashboard_service.load_initial().await;
    tracing::info!(
        "Plant simulator ready, {} processes need attention",
        wtp_service.active_alarm_count().await
    );
    let dashboard_poller = dashboard_service.start_polling();
    let kpi_poller = wtp_service.start_polling();

    // Flipped on shutdown; open streams end with it
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        wtp_service,
        shutdown: shutdown_rx,
    });

    // Build router (presentation layer)
    let router = presentation::router(state);

    // Start server
    let addr: SocketAddr = config.listen_addr.parse()?;
    tracing::info!("Starting wtp-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_tx.send_replace(true);
        })
        .await?;

    // Teardown: stop both timers before exiting
    dashboard_poller.stop().await;
    kpi_poller.stop().await;
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
