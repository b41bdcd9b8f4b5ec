//! technicolor-tracker - Technicolor gateway presence tracker
//!
//! Polls a Technicolor gateway for attached devices, tracks presence with a
//! consider-home grace window, and serves the device map over a small
//! read-only HTTP API.

mod api;
mod config;
mod error;
mod gateway;
mod router;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::ApiState;
use crate::gateway::TechnicolorGateway;
use crate::router::{PresenceTracker, RouterSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "technicolor_tracker=info,tower_http=debug".into()),
        )
        .init();

    tracing::info!("Starting technicolor-tracker...");

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!("Configuration loaded");

    // Connect the router session. A failure here means the gateway is not
    // ready; exit non-zero and let the supervisor retry later.
    let client = TechnicolorGateway::new(
        &config.router.host,
        config.router.port,
        &config.router.username,
        &config.router.password,
    );
    let session = Arc::new(RouterSession::new(
        config.router.host.clone(),
        Box::new(client),
    ));
    session.connect().await?;

    // First refresh before serving, then the background loop takes over
    let tracker = Arc::new(PresenceTracker::new(session.clone(), config.tracker));
    if let Err(e) = tracker.update_all().await {
        tracing::warn!("[Tracker] Initial poll failed: {}", e);
    }

    let poll_task = tokio::spawn(tracker.clone().start());

    // Build application router
    let state = ApiState::new(session.clone(), tracker);
    let cors = CorsLayer::permissive();

    let app = api::routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let host: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop polling, then release the gateway session. close() waits for any
    // in-flight call to leave the guard.
    poll_task.abort();
    if let Err(e) = session.close().await {
        tracing::warn!("[Session] Logout failed: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
