//! API module - HTTP handlers and routes

pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::router::session::RouterSession;
use crate::router::tracker::PresenceTracker;

/// Shared handler state: the session, the tracker and the process start time
#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<RouterSession>,
    pub tracker: Arc<PresenceTracker>,
    started_at: Instant,
}

impl ApiState {
    pub fn new(session: Arc<RouterSession>, tracker: Arc<PresenceTracker>) -> Self {
        Self {
            session,
            tracker,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::health_check))
        // Router info
        .route("/api/router", get(handlers::get_router_info))
        .route("/api/utilization", get(handlers::get_utilization))
        .route("/api/link", get(handlers::get_link_status))
        // Tracked devices
        .route("/api/devices", get(handlers::list_devices))
        .route("/api/devices/:mac", get(handlers::get_device))
        // On-demand actions
        .route("/api/poll", post(handlers::trigger_poll))
        .route("/api/reboot", post(handlers::reboot))
        // Options
        .route("/api/options", put(handlers::update_options))
}
