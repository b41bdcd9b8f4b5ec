//! Configuration module

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub router: RouterConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Gateway address and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    pub host: String,
    #[serde(default = "default_router_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Presence tracking options; consider_home and track_unknown can be
/// re-applied at runtime, the scan interval is fixed at startup.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct TrackerConfig {
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_consider_home")]
    pub consider_home_secs: u64,
    #[serde(default)]
    pub track_unknown: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            consider_home_secs: default_consider_home(),
            track_unknown: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_router_port() -> u16 {
    80
}

fn default_scan_interval() -> u64 {
    60
}

fn default_consider_home() -> u64 {
    180
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("TECHNICOLOR").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;

        Ok(config)
    }
}
