//! Router session manager
//!
//! Owns the authenticated gateway client plus the static system info fetched
//! at connect time. The vendored client is not safe for concurrent use, so
//! every network-facing call runs under one mutex: polling fetches,
//! on-demand fetches and logout are serialized per router.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, RwLock};

use crate::error::RouterError;
use crate::gateway::client::GatewayClient;
use crate::gateway::models::{DiagnosticsConnection, NetworkDevice, SystemInfo};

const DEFAULT_NAME: &str = "Technicolor router";

pub struct RouterSession {
    host: String,
    api: Mutex<Box<dyn GatewayClient>>,
    info: RwLock<Option<SystemInfo>>,
    connected: AtomicBool,
}

impl RouterSession {
    pub fn new(host: String, client: Box<dyn GatewayClient>) -> Self {
        Self {
            host,
            api: Mutex::new(client),
            info: RwLock::new(None),
            connected: AtomicBool::new(false),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Authenticate and cache the gateway's static system info.
    ///
    /// Any failure here, credential or transport, is an authentication
    /// failure: the router is not ready and the caller retries later.
    pub async fn connect(&self) -> Result<(), RouterError> {
        let api = self.api.lock().await;

        api.authenticate().await.map_err(|e| match e {
            RouterError::Authentication(_) => e,
            other => RouterError::Authentication(other.to_string()),
        })?;

        let info = api
            .system_info()
            .await
            .map_err(|e| RouterError::Authentication(e.to_string()))?;
        drop(api);

        tracing::info!(
            "[Session] Connected to {} ({})",
            self.host,
            info.product_name.as_deref().unwrap_or(DEFAULT_NAME)
        );

        *self.info.write().await = Some(info);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Static system info cached at connect time
    pub async fn system_info(&self) -> Option<SystemInfo> {
        self.info.read().await.clone()
    }

    /// Fresh utilization snapshot; does not touch the cached copy
    pub async fn utilization(&self) -> Result<SystemInfo, RouterError> {
        let api = self.api.lock().await;
        api.system_info().await
    }

    /// Current device inventory as reported by the gateway; no caching
    pub async fn network_devices(&self) -> Result<Vec<NetworkDevice>, RouterError> {
        let api = self.api.lock().await;
        api.network_devices().await
    }

    /// Ethernet/WAN link diagnostics
    pub async fn link_status(&self) -> Result<DiagnosticsConnection, RouterError> {
        let api = self.api.lock().await;
        api.diagnostics_connection().await
    }

    /// Log out of the gateway. Idempotent, safe if never connected, and safe
    /// to call while a poll is in flight (waits for the guard).
    pub async fn close(&self) -> Result<(), RouterError> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let api = self.api.lock().await;
        api.logout().await?;

        tracing::info!("[Session] Closed session with {}", self.host);
        Ok(())
    }

    // Operations the vendored client does not implement. These fail fast
    // rather than silently no-op.

    pub async fn traffic_meter(&self) -> Result<serde_json::Value, RouterError> {
        Err(RouterError::NotSupported("Traffic meter"))
    }

    pub async fn speed_test(&self) -> Result<serde_json::Value, RouterError> {
        Err(RouterError::NotSupported("Speed test"))
    }

    pub async fn allow_block_device(&self, _mac: &str, _allow: bool) -> Result<(), RouterError> {
        Err(RouterError::NotSupported("Device allow/block"))
    }

    pub async fn reboot(&self) -> Result<(), RouterError> {
        Err(RouterError::NotSupported("Reboot"))
    }
}
