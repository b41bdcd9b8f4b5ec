//! HTTP client for the Technicolor gateway web UI
//!
//! Thin adapter: session-cookie login, modal page fetches, scrape parsers.
//! The gateway serves its data as HTML modal fragments; parsers are pure
//! functions over the fetched markup.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;

use crate::error::RouterError;
use crate::gateway::models::{DiagnosticsConnection, NetworkDevice, SystemInfo};

/// Canonical device key: lower-case, colon-separated.
/// Falls back to a trimmed lower-case form for strings that are not a MAC.
pub fn normalize_mac(mac: &str) -> String {
    let hex: Vec<char> = mac
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .flat_map(|c| c.to_lowercase())
        .collect();

    if hex.len() != 12 {
        return mac.trim().to_lowercase();
    }

    hex.chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}

/// Gateway capability consumed by the router session.
///
/// Not safe for concurrent use; callers serialize access.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn authenticate(&self) -> Result<(), RouterError>;
    async fn system_info(&self) -> Result<SystemInfo, RouterError>;
    async fn network_devices(&self) -> Result<Vec<NetworkDevice>, RouterError>;
    async fn diagnostics_connection(&self) -> Result<DiagnosticsConnection, RouterError>;
    async fn logout(&self) -> Result<(), RouterError>;
}

/// Client for a single Technicolor gateway
pub struct TechnicolorGateway {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl TechnicolorGateway {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Self {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(true) // Gateways ship self-signed certs
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{}:{}", host, port),
            username: username.to_string(),
            password: password.to_string(),
            http,
        }
    }

    /// Fetch one modal fragment under the authenticated session
    async fn fetch_modal(&self, modal: &str) -> Result<String, RouterError> {
        let url = format!("{}/modals/{}", self.base_url, modal);
        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RouterError::Authentication(format!(
                "session rejected while fetching {}",
                modal
            )));
        }
        if !status.is_success() {
            return Err(RouterError::Parse(format!("{} returned {}", modal, status)));
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl GatewayClient for TechnicolorGateway {
    async fn authenticate(&self) -> Result<(), RouterError> {
        let url = format!("{}/login.lp", self.base_url);
        let params = [
            ("user", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let resp = self.http.post(&url).form(&params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RouterError::Authentication(format!(
                "login returned {} for user {}",
                status, self.username
            )));
        }

        // Wrong credentials serve the login form back instead of the
        // authenticated landing page.
        let body = resp.text().await?;
        if body.contains("login.lp") && body.contains("password") {
            return Err(RouterError::Authentication(format!(
                "credentials rejected for user {}",
                self.username
            )));
        }

        tracing::debug!("[Gateway] Session established with {}", self.base_url);
        Ok(())
    }

    async fn system_info(&self) -> Result<SystemInfo, RouterError> {
        let html = self.fetch_modal("gateway-modal.lp").await?;
        Ok(parse_system_info(&html))
    }

    async fn network_devices(&self) -> Result<Vec<NetworkDevice>, RouterError> {
        let html = self.fetch_modal("device-modal.lp").await?;
        Ok(parse_device_modal(&html))
    }

    async fn diagnostics_connection(&self) -> Result<DiagnosticsConnection, RouterError> {
        let html = self.fetch_modal("diagnostics-connection-modal.lp").await?;
        Ok(parse_diagnostics(&html))
    }

    async fn logout(&self) -> Result<(), RouterError> {
        let url = format!("{}/logout.lp", self.base_url);
        let resp = self.http.get(&url).send().await?;

        if !resp.status().is_success() {
            tracing::debug!("[Gateway] Logout returned {}", resp.status());
        }
        Ok(())
    }
}

// ============================================================================
// Scrape parsers
// ============================================================================

/// Strip markup and collapse whitespace in a table cell
fn clean_cell(raw: &str) -> String {
    let tags = Regex::new(r"<[^>]*>").unwrap();
    let text = tags.replace_all(raw, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract all `<td>` cells per `<tr>` row
fn table_rows(html: &str) -> Vec<Vec<String>> {
    let row_re = Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").unwrap();
    let cell_re = Regex::new(r"(?s)<td[^>]*>(.*?)</td>").unwrap();

    row_re
        .captures_iter(html)
        .map(|row| {
            cell_re
                .captures_iter(&row[1])
                .map(|cell| clean_cell(&cell[1]))
                .collect()
        })
        .collect()
}

/// Two-cell rows as a label → value map
fn parse_label_pairs(html: &str) -> HashMap<String, String> {
    table_rows(html)
        .into_iter()
        .filter(|cells| cells.len() == 2)
        .map(|mut cells| {
            let value = cells.pop().unwrap_or_default();
            let label = cells.pop().unwrap_or_default();
            (label, value)
        })
        .collect()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_system_info(html: &str) -> SystemInfo {
    let pairs = parse_label_pairs(html);

    SystemInfo {
        product_vendor: non_empty(pairs.get("Product Vendor")),
        product_name: non_empty(pairs.get("Product Name")),
        firmware_version: non_empty(pairs.get("Software Version")),
        hardware_version: non_empty(pairs.get("Hardware Version")),
        serial_number: non_empty(pairs.get("Serial Number")),
        uptime_seconds: pairs.get("Uptime").and_then(|s| s.trim().parse().ok()),
    }
}

fn parse_diagnostics(html: &str) -> DiagnosticsConnection {
    let pairs = parse_label_pairs(html);

    DiagnosticsConnection {
        link_state: non_empty(pairs.get("Link State")),
        wan_mode: non_empty(pairs.get("WAN Mode")),
        wan_ip: non_empty(pairs.get("IP Address")),
        dns_servers: pairs
            .get("DNS Servers")
            .map(|s| {
                s.split(',')
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Device table rows: name, MAC, IP, connection type, SSID, speed
fn parse_device_modal(html: &str) -> Vec<NetworkDevice> {
    let mac_re = Regex::new(r"^[0-9A-Fa-f]{2}([:.-][0-9A-Fa-f]{2}){5}$").unwrap();
    let mut devices = Vec::new();

    for cells in table_rows(html) {
        if cells.len() < 6 || !mac_re.is_match(&cells[1]) {
            continue;
        }

        let conn_type = cells[3].to_lowercase();
        devices.push(NetworkDevice {
            mac_address: cells[1].clone(),
            friendly_name: cells[0].clone(),
            ipv4: Some(cells[2].clone()).filter(|s| !s.is_empty()),
            speed: Some(cells[5].clone()).filter(|s| !s.is_empty()),
            ssid: Some(cells[4].clone()).filter(|s| !s.is_empty()),
            conn_ap_mac: None,
            is_guest: conn_type.contains("guest"),
            is_satellite: conn_type.contains("satellite") || conn_type.contains("extender"),
            is_ethernet: conn_type == "ethernet",
        });
    }

    devices
}
