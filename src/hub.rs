use crate::api::{self, readings, Error};
use crate::device::{Device, DeviceKey};
use crate::model::{self, Snapshot};
use serde_json::Value;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(10);
/// Shortest poll interval; `tokio::time::interval` rejects a zero period.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Solplanet hub: one inverter with its battery, PV strings and optional meter.
pub struct Hub {
    api: model::Api,
    id: String,
    name: String,
    meter: bool,
    devices: BTreeMap<DeviceKey, Device>,
}

impl Hub {
    pub fn new(api: model::Api, inverter_id: &str, name: Option<String>, meter: bool) -> Hub {
        let name = name.unwrap_or_else(|| inverter_id.to_string());

        let mut keys = vec![DeviceKey::Inverter, DeviceKey::Battery, DeviceKey::Solar];
        if meter {
            keys.push(DeviceKey::Meter);
        }
        let devices = keys
            .into_iter()
            .map(|key| (key, Device::new(key, inverter_id, &name)))
            .collect();

        Hub {
            api,
            id: inverter_id.to_lowercase(),
            name,
            meter,
            devices,
        }
    }

    pub fn hub_id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device(&self, key: DeviceKey) -> Option<&Device> {
        self.devices.get(&key)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Fetch all device payloads concurrently and reshape them into a fresh snapshot.
    ///
    /// Devices whose fetch failed are left out of the snapshot. An error is returned only
    /// when nothing could be read at all.
    pub async fn fetch_data(&self) -> Result<Snapshot, Error> {
        let meter = async {
            if self.meter {
                Some(api::meter_data(&self.api).await)
            } else {
                None
            }
        };

        let (inverter, battery, meter) = tokio::join!(
            api::inverter_data(&self.api),
            api::battery_data(&self.api),
            meter
        );

        let mut snapshot = Snapshot::new();
        let mut errors = Vec::new();

        match inverter {
            Ok(data) => {
                snapshot.insert(DeviceKey::Inverter, readings::inverter_readings(&data));
                snapshot.insert(DeviceKey::Solar, readings::solar_readings(&data));
            }
            Err(e) => errors.push((DeviceKey::Inverter, e)),
        }

        match battery {
            Ok(data) => snapshot.insert(DeviceKey::Battery, readings::battery_readings(&data)),
            Err(e) => errors.push((DeviceKey::Battery, e)),
        }

        match meter {
            Some(Ok(data)) => snapshot.insert(DeviceKey::Meter, readings::meter_readings(&data)),
            Some(Err(e)) => errors.push((DeviceKey::Meter, e)),
            None => {}
        }

        for (key, e) in errors.iter() {
            log::warn!("Unable to fetch {} data of {}: {}", key, self.id, e);
        }

        if snapshot.is_empty() {
            Err(errors
                .into_iter()
                .next()
                .map(|(_, e)| e)
                .unwrap_or(Error::NoData))
        } else {
            Ok(snapshot)
        }
    }

    /// Test connectivity to the inverter. An answer listing no inverter counts as a failure.
    pub async fn test_connection(&self) -> bool {
        match api::inverters(&self.api).await {
            Ok(list) => !list.inverters.is_empty(),
            Err(e) => {
                log::warn!("Connection test of {} failed: {}", self.id, e);
                false
            }
        }
    }

    pub async fn dump_devices(&self) -> Result<BTreeMap<String, Value>, Error> {
        let mut codes = vec![2, 4];
        if self.meter {
            codes.push(3);
        }
        api::dump_devices(&self.api, &codes).await
    }
}

/// Periodic poller owning the most recent snapshot shared by every sensor.
pub struct Coordinator {
    hub: Hub,
    interval: Duration,
    timeout: Duration,
    data: RwLock<Option<Arc<Snapshot>>>,
    last_update_success: AtomicBool,
    /// Timestamp of last successful refresh
    last_update: Mutex<Option<Instant>>,
}

impl Coordinator {
    pub fn new(hub: Hub, interval: Duration, timeout: Duration) -> Coordinator {
        if interval < MIN_INTERVAL {
            log::warn!(
                "Poll interval of {:?} too short, using {:?}",
                interval,
                MIN_INTERVAL
            );
        }

        Coordinator {
            hub,
            interval: interval.max(MIN_INTERVAL),
            timeout,
            data: RwLock::new(None),
            last_update_success: AtomicBool::new(false),
            last_update: Mutex::new(None),
        }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Most recent snapshot, `None` until the first successful refresh.
    pub fn data(&self) -> Option<Arc<Snapshot>> {
        self.data.read().ok().and_then(|data| data.clone())
    }

    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    /// Time elapsed since the last successful refresh.
    pub fn since_last_update(&self) -> Option<Duration> {
        self.last_update
            .lock()
            .ok()
            .and_then(|ts| ts.map(|instant| instant.elapsed()))
    }

    fn touch(&self) {
        if let Ok(mut ts) = self.last_update.lock() {
            *ts = Some(Instant::now());
        } else {
            log::trace!("Unable to lock timestamp mutex")
        }
    }

    fn store(&self, snapshot: Arc<Snapshot>) {
        match self.data.write() {
            Ok(mut data) => *data = Some(snapshot),
            Err(_) => log::error!("Snapshot lock poisoned, keeping previous data"),
        }
    }

    /// Fetch a new snapshot under the update timeout. The previous snapshot is kept when the
    /// fetch fails.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, Error> {
        let result = tokio::time::timeout(self.timeout, self.hub.fetch_data())
            .await
            .unwrap_or(Err(Error::Timeout));

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.store(snapshot.clone());
                self.last_update_success.store(true, Ordering::SeqCst);
                self.touch();
                log::debug!("Refreshed {} data", self.hub.hub_id());
                Ok(snapshot)
            }
            Err(e) => {
                log::warn!("Error fetching {} data: {}", self.hub.hub_id(), e);
                self.last_update_success.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Refresh immediately, then every `interval`. Ticks missed while a refresh is running
    /// are skipped.
    pub async fn run(self: Arc<Self>) {
        log::info!(
            "Polling {} every {}s",
            self.hub.hub_id(),
            self.interval.as_secs()
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if self.refresh().await.is_err() {
                log::trace!("Keeping previous {} snapshot", self.hub.hub_id());
            }
        }
    }
}
