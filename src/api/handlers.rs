//! HTTP handlers
//!
//! Read-only views over the shared device map plus the on-demand gateway
//! fetches. Handlers never mutate tracker state except the manual poll
//! trigger, which runs the same cycle the background loop runs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::config::TrackerConfig;
use crate::error::AppError;
use crate::gateway::models::SystemInfo;
use crate::router::devices::ConnectedDevice;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub tracked_devices: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_poll_age_seconds: Option<i64>,
}

/// Health check handler
pub async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    let last_poll_age_seconds = state
        .tracker
        .last_poll()
        .await
        .map(|t| (chrono::Utc::now() - t).num_seconds());

    Json(HealthResponse {
        status: "ok".to_string(),
        service: "technicolor-tracker".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        tracked_devices: state.tracker.devices().await.len(),
        last_poll_age_seconds,
    })
}

#[derive(Serialize)]
pub struct RouterInfoResponse {
    pub host: String,
    #[serde(flatten)]
    pub info: SystemInfo,
}

/// GET /api/router - static system info cached at connect time
pub async fn get_router_info(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, AppError> {
    let info = state
        .session
        .system_info()
        .await
        .ok_or_else(|| AppError::NotFound("Router info not available".to_string()))?;

    Ok(Json(RouterInfoResponse {
        host: state.session.host().to_string(),
        info,
    }))
}

/// GET /api/utilization - fresh system info snapshot from the gateway
pub async fn get_utilization(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.session.utilization().await?))
}

/// GET /api/link - ethernet/WAN link diagnostics
pub async fn get_link_status(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.session.link_status().await?))
}

#[derive(Deserialize, Default)]
pub struct DeviceQuery {
    pub active: Option<bool>,
}

/// GET /api/devices - tracked devices, optionally filtered by active flag
pub async fn list_devices(
    State(state): State<ApiState>,
    Query(query): Query<DeviceQuery>,
) -> impl IntoResponse {
    let mut devices: Vec<ConnectedDevice> = state.tracker.devices().await.into_values().collect();

    if let Some(active) = query.active {
        devices.retain(|d| d.active == active);
    }
    devices.sort_by(|a, b| a.mac.cmp(&b.mac));

    Json(devices)
}

/// GET /api/devices/:mac - one tracked device, MAC in any textual form
pub async fn get_device(
    State(state): State<ApiState>,
    Path(mac): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .tracker
        .device(&mac)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No tracked device {}", mac)))
}

#[derive(Serialize)]
pub struct PollResponse {
    pub message: String,
    pub tracked_devices: usize,
}

/// POST /api/poll - run one poll cycle outside the schedule
pub async fn trigger_poll(State(state): State<ApiState>) -> Result<impl IntoResponse, AppError> {
    state.tracker.update_all().await?;

    Ok(Json(PollResponse {
        message: "Poll completed".to_string(),
        tracked_devices: state.tracker.devices().await.len(),
    }))
}

/// POST /api/reboot - not supported by the vendored client; answers 501
pub async fn reboot(State(state): State<ApiState>) -> Result<impl IntoResponse, AppError> {
    state.session.reboot().await?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Serialize)]
pub struct OptionsResponse {
    pub message: String,
    /// The poll cadence is fixed at startup; changing it needs a restart
    pub reload_required: bool,
}

/// PUT /api/options - re-apply tracker options at runtime
pub async fn update_options(
    State(state): State<ApiState>,
    Json(options): Json<TrackerConfig>,
) -> impl IntoResponse {
    let reload_required = state.tracker.apply_options(options).await;

    Json(OptionsResponse {
        message: "Options applied".to_string(),
        reload_required,
    })
}
