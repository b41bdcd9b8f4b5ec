//! Tracked device records

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gateway::client::normalize_mac;
use crate::gateway::models::NetworkDevice;

/// How a device is attached to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceKind {
    #[serde(rename = "ap")]
    AccessPoint,
    #[serde(rename = "guest")]
    Guest,
    #[serde(rename = "ethernet")]
    Ethernet,
    #[serde(rename = "wireless")]
    Wireless,
}

impl DeviceKind {
    pub fn from_wire(device: &NetworkDevice) -> Self {
        if device.is_satellite {
            DeviceKind::AccessPoint
        } else if device.is_guest {
            DeviceKind::Guest
        } else if device.is_ethernet {
            DeviceKind::Ethernet
        } else {
            DeviceKind::Wireless
        }
    }
}

/// One tracked device, keyed in the device map by its normalized MAC.
///
/// Entries are updated in place on every poll and never deleted; devices
/// that leave the network persist as inactive.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedDevice {
    pub mac: String,
    pub name: String,
    pub active: bool,
    pub last_seen: DateTime<Utc>,
    pub kind: DeviceKind,
    /// Link rate in Mb/s
    pub link_rate: Option<f64>,
    pub ip: Option<String>,
    pub ssid: Option<String>,
    pub conn_ap_mac: Option<String>,
}

impl ConnectedDevice {
    /// Build a record from a wire report. The tracker owns the active flag
    /// and last_seen; the values set here apply to first sightings.
    pub fn from_network_device(device: &NetworkDevice, seen_at: DateTime<Utc>) -> Self {
        Self {
            mac: normalize_mac(&device.mac_address),
            name: device.friendly_name.trim().to_string(),
            active: true,
            last_seen: seen_at,
            kind: DeviceKind::from_wire(device),
            link_rate: device
                .speed
                .as_deref()
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.parse().ok()),
            ip: device.ipv4.clone(),
            ssid: device.ssid.clone(),
            conn_ap_mac: device.conn_ap_mac.as_deref().map(normalize_mac),
        }
    }
}
