//! Wire records reported by the gateway

use serde::{Deserialize, Serialize};

/// Static system information from the gateway info modal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub product_vendor: Option<String>,
    pub product_name: Option<String>,
    pub firmware_version: Option<String>,
    pub hardware_version: Option<String>,
    pub serial_number: Option<String>,
    pub uptime_seconds: Option<u64>,
}

/// A single attached device as reported by the device modal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDevice {
    pub mac_address: String,
    pub friendly_name: String,
    pub ipv4: Option<String>,
    /// Link rate as reported, e.g. "866" or "866 Mbps"
    pub speed: Option<String>,
    pub ssid: Option<String>,
    /// MAC of the access point the device is associated with, if reported
    pub conn_ap_mac: Option<String>,
    pub is_guest: bool,
    pub is_satellite: bool,
    pub is_ethernet: bool,
}

/// Ethernet/WAN link diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsConnection {
    pub link_state: Option<String>,
    pub wan_mode: Option<String>,
    pub wan_ip: Option<String>,
    pub dns_servers: Vec<String>,
}
