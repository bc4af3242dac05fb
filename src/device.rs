use serde::Serialize;
use std::fmt;

pub const DOMAIN: &str = "solplanet";
pub const MANUFACTURER: &str = "Solplanet/AISWEI";
pub const MODEL: &str = "Solplanet";

/// Key of a device within a hub and within a reading snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKey {
    Inverter,
    Battery,
    Meter,
    Solar,
}

impl DeviceKey {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKey::Inverter => "inverter",
            DeviceKey::Battery => "battery",
            DeviceKey::Meter => "meter",
            DeviceKey::Solar => "solar",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DeviceKey::Inverter => "Inverter",
            DeviceKey::Battery => "Battery",
            DeviceKey::Meter => "Meter",
            DeviceKey::Solar => "Solar",
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static device record. Devices live as long as the hub that created them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub model: &'static str,
    pub manufacturer: &'static str,
}

/// Information linking sensors to their device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
}

impl Device {
    pub fn new(key: DeviceKey, inverter_id: &str, hub_name: &str) -> Device {
        Device {
            id: format!("{}_{}", inverter_id, key),
            name: format!("{} {}", hub_name, key.label()),
            model: MODEL,
            manufacturer: MANUFACTURER,
        }
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![(DOMAIN.to_string(), self.id.clone())],
            name: self.name.clone(),
            model: self.model.to_string(),
            manufacturer: self.manufacturer.to_string(),
        }
    }
}
