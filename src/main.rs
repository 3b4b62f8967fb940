// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_api::HttpSentinelApi;
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
    let app_config = load_app_config()?;

    // Backend client (infrastructure layer)
    let api = Arc::new(HttpSentinelApi::new(
        &app_config.backend.base_url,
        Duration::from_millis(app_config.backend.connect_timeout_ms),
    )?);

    // Polling channels and controls (application layer)
    let dashboard = DashboardService::new(api, &app_config.polling, app_config.sparkline.clone());
    dashboard.start();

    let state = Arc::new(AppState {
        dashboard: dashboard.clone(),
    });

    // Build router (presentation layer)
    let router = presentation::router(state);

    let addr: SocketAddr = app_config.server.listen.parse()?;
    tracing::info!(
        "Starting sentinel-dashboard on {} (backend {})",
        addr,
        app_config.backend.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    dashboard.shutdown();
    tracing::info!("Shut down");

    Ok(())
}
