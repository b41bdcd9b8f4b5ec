//! Device presence tracker
//!
//! Polls the router inventory on a fixed interval and merges it into the
//! shared device map. Every poll cycle shares a single wall-clock reading,
//! so active/inactive classification is deterministic within a cycle.
//!
//! Two payload-less broadcast signals are emitted after a successful poll:
//! an unconditional devices-updated signal, and a new-device signal when the
//! inventory introduced an address the map had never seen. Observers re-read
//! the map on either signal.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration as TimeDelta, Utc};
use tokio::sync::{broadcast, RwLock};
use tokio::time::{self, Duration};

use crate::config::TrackerConfig;
use crate::error::RouterError;
use crate::gateway::client::normalize_mac;
use crate::gateway::models::NetworkDevice;
use crate::router::devices::ConnectedDevice;
use crate::router::session::RouterSession;

pub struct PresenceTracker {
    session: Arc<RouterSession>,
    devices: RwLock<HashMap<String, ConnectedDevice>>,
    options: RwLock<TrackerConfig>,
    device_update: broadcast::Sender<()>,
    device_new: broadcast::Sender<()>,
    last_poll: RwLock<Option<DateTime<Utc>>>,
}

impl PresenceTracker {
    pub fn new(session: Arc<RouterSession>, options: TrackerConfig) -> Self {
        let (device_update, _) = broadcast::channel(16);
        let (device_new, _) = broadcast::channel(16);

        Self {
            session,
            devices: RwLock::new(HashMap::new()),
            options: RwLock::new(options),
            device_update,
            device_new,
            last_poll: RwLock::new(None),
        }
    }

    /// Fires after every successful poll
    pub fn subscribe_updates(&self) -> broadcast::Receiver<()> {
        self.device_update.subscribe()
    }

    /// Fires when a poll introduced a previously unseen address
    pub fn subscribe_new(&self) -> broadcast::Receiver<()> {
        self.device_new.subscribe()
    }

    /// Snapshot of the tracked devices
    pub async fn devices(&self) -> HashMap<String, ConnectedDevice> {
        self.devices.read().await.clone()
    }

    /// Look up one device by MAC in any textual form
    pub async fn device(&self, mac: &str) -> Option<ConnectedDevice> {
        self.devices.read().await.get(&normalize_mac(mac)).cloned()
    }

    /// Timestamp of the last successful poll
    pub async fn last_poll(&self) -> Option<DateTime<Utc>> {
        self.last_poll.read().await.clone()
    }

    /// Start the poll loop (runs forever)
    pub async fn start(self: Arc<Self>) {
        let interval = self.options.read().await.scan_interval_secs;
        tracing::info!("[Tracker] Starting presence polling (interval: {}s)", interval);

        loop {
            time::sleep(Duration::from_secs(interval)).await;

            if let Err(e) = self.update_all().await {
                tracing::warn!("[Tracker] Poll failed, keeping previous state: {}", e);
            }
        }
    }

    /// One poll cycle: fetch the inventory, merge it into the map and notify
    /// observers. A failed fetch leaves the map untouched and fires nothing.
    pub async fn update_all(&self) -> Result<(), RouterError> {
        let now = Utc::now();
        let inventory = self.session.network_devices().await?;

        let saw_new = self.apply_inventory(&inventory, now).await;
        *self.last_poll.write().await = Some(now);

        tracing::debug!(
            "[Tracker] Polled {}: {} reported",
            self.session.host(),
            inventory.len()
        );

        let _ = self.device_update.send(());
        if saw_new {
            let _ = self.device_new.send(());
        }
        Ok(())
    }

    /// Merge a fetched inventory into the map at one shared timestamp.
    /// Returns true when at least one previously unseen address appeared.
    async fn apply_inventory(&self, inventory: &[NetworkDevice], now: DateTime<Utc>) -> bool {
        let opts = *self.options.read().await;
        let consider_home = TimeDelta::seconds(opts.consider_home_secs as i64);
        let mut saw_new = false;

        let mut devices = self.devices.write().await;

        // Absence is never detected directly: entries the inventory no longer
        // reports age out here, once their last sighting falls outside the
        // consider-home window.
        for device in devices.values_mut() {
            device.active = now - device.last_seen < consider_home;
        }

        for report in inventory {
            let mac = normalize_mac(&report.mac_address);

            let last_time = match devices.get(&mac) {
                Some(existing) => existing.last_seen,
                None => {
                    if !opts.track_unknown && report.friendly_name.trim().is_empty() {
                        tracing::debug!("[Tracker] Skipping unnamed device {}", mac);
                        continue;
                    }
                    tracing::info!("[Tracker] New device: {}", mac);
                    saw_new = true;
                    now
                }
            };

            let mut record = ConnectedDevice::from_network_device(report, now);
            // Scored against the previous sighting; a device that reappears
            // after outliving the window stays inactive for this cycle.
            record.active = now - last_time < consider_home;
            record.last_seen = now;
            devices.insert(mac, record);
        }

        saw_new
    }

    /// Live-apply option changes. Returns true when a restart is required
    /// (the poll cadence is fixed at spawn time).
    pub async fn apply_options(&self, new: TrackerConfig) -> bool {
        let mut opts = self.options.write().await;
        let req_reload = new.scan_interval_secs != opts.scan_interval_secs;

        if *opts != new {
            tracing::info!(
                "[Tracker] Options updated: consider_home={}s track_unknown={}",
                new.consider_home_secs,
                new.track_unknown
            );
        }
        *opts = new;
        req_reload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::gateway::client::GatewayClient;
    use crate::gateway::models::{DiagnosticsConnection, SystemInfo};

    /// Scripted gateway: each poll pops the next canned inventory response,
    /// then keeps returning an empty inventory.
    struct ScriptedGateway {
        responses: StdMutex<VecDeque<Result<Vec<NetworkDevice>, RouterError>>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<Vec<NetworkDevice>, RouterError>>) -> Self {
            Self {
                responses: StdMutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl GatewayClient for ScriptedGateway {
        async fn authenticate(&self) -> Result<(), RouterError> {
            Ok(())
        }

        async fn system_info(&self) -> Result<SystemInfo, RouterError> {
            Ok(SystemInfo::default())
        }

        async fn network_devices(&self) -> Result<Vec<NetworkDevice>, RouterError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn diagnostics_connection(&self) -> Result<DiagnosticsConnection, RouterError> {
            Ok(DiagnosticsConnection::default())
        }

        async fn logout(&self) -> Result<(), RouterError> {
            Ok(())
        }
    }

    fn make_device(mac: &str, name: &str) -> NetworkDevice {
        NetworkDevice {
            mac_address: mac.to_string(),
            friendly_name: name.to_string(),
            ipv4: Some("192.168.1.50".to_string()),
            speed: Some("866".to_string()),
            ssid: Some("HomeNet".to_string()),
            conn_ap_mac: None,
            is_guest: false,
            is_satellite: false,
            is_ethernet: false,
        }
    }

    fn make_tracker(
        responses: Vec<Result<Vec<NetworkDevice>, RouterError>>,
        options: TrackerConfig,
    ) -> PresenceTracker {
        let session = Arc::new(RouterSession::new(
            "192.168.1.1".to_string(),
            Box::new(ScriptedGateway::new(responses)),
        ));
        PresenceTracker::new(session, options)
    }

    fn options(consider_home_secs: u64) -> TrackerConfig {
        TrackerConfig {
            scan_interval_secs: 60,
            consider_home_secs,
            track_unknown: false,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn device_reseen_within_window_stays_active_and_advances() {
        let tracker = make_tracker(Vec::new(), options(180));
        let a = make_device("aa:bb:cc:dd:ee:01", "phone");

        tracker.apply_inventory(&[a.clone()], at(0)).await;
        tracker.apply_inventory(&[a], at(60)).await;

        let device = tracker.device("aa:bb:cc:dd:ee:01").await.unwrap();
        assert!(device.active);
        assert_eq!(device.last_seen, at(60));
    }

    #[tokio::test]
    async fn absent_device_ages_out_of_the_window() {
        let tracker = make_tracker(Vec::new(), options(180));
        let a = make_device("aa:bb:cc:dd:ee:01", "phone");

        tracker.apply_inventory(&[a], at(100)).await;

        // Still inside the grace window
        tracker.apply_inventory(&[], at(200)).await;
        assert!(tracker.device("aa:bb:cc:dd:ee:01").await.unwrap().active);

        // (400 - 100) >= 180: demoted even though the poll never saw it
        tracker.apply_inventory(&[], at(400)).await;
        let device = tracker.device("aa:bb:cc:dd:ee:01").await.unwrap();
        assert!(!device.active);
        assert_eq!(device.last_seen, at(100));
    }

    #[tokio::test]
    async fn reappearing_stale_device_is_scored_against_previous_sighting() {
        let tracker = make_tracker(Vec::new(), options(180));
        let a = make_device("aa:bb:cc:dd:ee:01", "phone");

        tracker.apply_inventory(&[a.clone()], at(0)).await;
        tracker.apply_inventory(&[a.clone()], at(400)).await;

        // Present again, but the previous sighting is outside the window
        let device = tracker.device("aa:bb:cc:dd:ee:01").await.unwrap();
        assert!(!device.active);
        assert_eq!(device.last_seen, at(400));

        // The next cycle sees a fresh last_seen and promotes it
        tracker.apply_inventory(&[a], at(460)).await;
        assert!(tracker.device("aa:bb:cc:dd:ee:01").await.unwrap().active);
    }

    #[tokio::test]
    async fn mac_renderings_collapse_into_one_entry() {
        let tracker = make_tracker(Vec::new(), options(180));

        tracker
            .apply_inventory(&[make_device("AA:BB:CC:DD:EE:01", "phone")], at(0))
            .await;
        tracker
            .apply_inventory(&[make_device("aa-bb-cc-dd-ee-01", "phone")], at(60))
            .await;

        assert_eq!(tracker.devices().await.len(), 1);
    }

    #[tokio::test]
    async fn new_device_flag_only_for_unseen_addresses() {
        let tracker = make_tracker(Vec::new(), options(180));
        let b = make_device("aa:bb:cc:dd:ee:02", "printer");

        assert!(tracker.apply_inventory(&[b.clone()], at(0)).await);
        let device = tracker.device("aa:bb:cc:dd:ee:02").await.unwrap();
        assert!(device.active);

        assert!(!tracker.apply_inventory(&[b.clone()], at(60)).await);

        let c = make_device("aa:bb:cc:dd:ee:03", "tablet");
        assert!(tracker.apply_inventory(&[b, c], at(120)).await);
    }

    #[tokio::test]
    async fn signals_fire_after_successful_poll() {
        let b = make_device("aa:bb:cc:dd:ee:02", "printer");
        let tracker = make_tracker(
            vec![Ok(vec![b.clone()]), Ok(vec![b])],
            options(180),
        );

        let mut updates = tracker.subscribe_updates();
        let mut new_devices = tracker.subscribe_new();

        tracker.update_all().await.unwrap();
        assert!(updates.try_recv().is_ok());
        assert!(new_devices.try_recv().is_ok());

        // Same inventory again: updated fires, new does not
        tracker.update_all().await.unwrap();
        assert!(updates.try_recv().is_ok());
        assert!(new_devices.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_poll_leaves_map_untouched_and_silent() {
        let a = make_device("aa:bb:cc:dd:ee:01", "phone");
        let tracker = make_tracker(
            vec![
                Ok(vec![a]),
                Err(RouterError::Parse("connection reset".to_string())),
            ],
            options(180),
        );

        tracker.update_all().await.unwrap();
        let before = tracker.devices().await;
        let last_poll = tracker.last_poll().await;

        let mut updates = tracker.subscribe_updates();
        let mut new_devices = tracker.subscribe_new();

        assert!(tracker.update_all().await.is_err());

        let after = tracker.devices().await;
        assert_eq!(after.len(), before.len());
        let (b, a2) = (
            &before["aa:bb:cc:dd:ee:01"],
            &after["aa:bb:cc:dd:ee:01"],
        );
        assert_eq!(b.last_seen, a2.last_seen);
        assert_eq!(b.active, a2.active);
        assert_eq!(tracker.last_poll().await, last_poll);
        assert!(updates.try_recv().is_err());
        assert!(new_devices.try_recv().is_err());
    }

    #[tokio::test]
    async fn unnamed_devices_skipped_unless_track_unknown() {
        let tracker = make_tracker(Vec::new(), options(180));
        let unnamed = make_device("aa:bb:cc:dd:ee:04", "  ");

        assert!(!tracker.apply_inventory(&[unnamed.clone()], at(0)).await);
        assert!(tracker.devices().await.is_empty());

        let req_reload = tracker
            .apply_options(TrackerConfig {
                track_unknown: true,
                ..options(180)
            })
            .await;
        assert!(!req_reload);

        assert!(tracker.apply_inventory(&[unnamed], at(60)).await);
        assert_eq!(tracker.devices().await.len(), 1);
    }

    #[tokio::test]
    async fn interval_change_requires_reload() {
        let tracker = make_tracker(Vec::new(), options(180));

        let req_reload = tracker
            .apply_options(TrackerConfig {
                scan_interval_secs: 30,
                ..options(180)
            })
            .await;
        assert!(req_reload);
    }
}
