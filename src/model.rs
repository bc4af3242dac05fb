use crate::device::DeviceKey;
use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

/// Readings of a single device, keyed by data key. `None` marks a field the device reported
/// without a value.
pub type Readings = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone)]
pub struct Api {
    pub base_url: String,
    pub serial_number: String,
    pub client: reqwest::Client,
}

/// Per-device readings collected by a single poll.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub devices: HashMap<DeviceKey, Readings>,
    pub taken_at: SystemTime,
}

impl Snapshot {
    pub fn new() -> Snapshot {
        Snapshot {
            devices: HashMap::new(),
            taken_at: SystemTime::now(),
        }
    }

    pub fn insert(&mut self, key: DeviceKey, readings: Readings) {
        self.devices.insert(key, readings);
    }

    pub fn readings(&self, key: DeviceKey) -> Option<&Readings> {
        self.devices.get(&key)
    }

    pub fn contains(&self, device_key: DeviceKey, data_key: &str) -> bool {
        self.readings(device_key)
            .map(|r| r.contains_key(data_key))
            .unwrap_or(false)
    }

    /// Value of `data_key` on `device_key`, `None` when the device, the key or the value is
    /// missing.
    pub fn get(&self, device_key: DeviceKey, data_key: &str) -> Option<f64> {
        self.readings(device_key)
            .and_then(|r| r.get(data_key))
            .copied()
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::new()
    }
}
