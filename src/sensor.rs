//! Sensors exposing single snapshot fields with units and availability.
//!
//! Each sensor is described by a static table row naming the device and the data key it
//! reads. A sensor is available only while the last refresh succeeded and the snapshot
//! carries a value for its key.

use crate::device::{Device, DeviceInfo, DeviceKey};
use crate::hub::{Coordinator, Hub};
use crate::model::Snapshot;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Voltage,
    Current,
    Power,
    Energy,
    Battery,
    Temperature,
    Frequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Voltage,
    Current,
    Power,
    Energy,
    Charge,
    Temperature,
    Frequency,
}

impl SensorKind {
    pub fn device_class(self) -> DeviceClass {
        match self {
            SensorKind::Voltage => DeviceClass::Voltage,
            SensorKind::Current => DeviceClass::Current,
            SensorKind::Power => DeviceClass::Power,
            SensorKind::Energy => DeviceClass::Energy,
            SensorKind::Charge => DeviceClass::Battery,
            SensorKind::Temperature => DeviceClass::Temperature,
            SensorKind::Frequency => DeviceClass::Frequency,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::Voltage => "V",
            SensorKind::Current => "A",
            SensorKind::Power => "kW",
            SensorKind::Energy => "kWh",
            SensorKind::Charge => "%",
            SensorKind::Temperature => "°C",
            SensorKind::Frequency => "Hz",
        }
    }

    pub fn state_class(self) -> StateClass {
        match self {
            SensorKind::Energy => StateClass::TotalIncreasing,
            _ => StateClass::Measurement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDescription {
    pub name: &'static str,
    pub device_key: DeviceKey,
    pub data_key: &'static str,
    pub kind: SensorKind,
    pub entity_category: Option<EntityCategory>,
}

const fn describe(
    name: &'static str,
    device_key: DeviceKey,
    data_key: &'static str,
    kind: SensorKind,
) -> SensorDescription {
    SensorDescription {
        name,
        device_key,
        data_key,
        kind,
        entity_category: None,
    }
}

const fn diagnostic(description: SensorDescription) -> SensorDescription {
    SensorDescription {
        entity_category: Some(EntityCategory::Diagnostic),
        ..description
    }
}

use DeviceKey::{Battery, Inverter, Meter, Solar};
use SensorKind::{Charge, Current, Energy, Frequency, Power, Temperature, Voltage};

pub const INVERTER_SENSORS: &[SensorDescription] = &[
    describe("Voltage phase 1", Inverter, "voltage_1", Voltage),
    describe("Voltage phase 2", Inverter, "voltage_2", Voltage),
    describe("Voltage phase 3", Inverter, "voltage_3", Voltage),
    describe("Current phase 1", Inverter, "current_1", Current),
    describe("Current phase 2", Inverter, "current_2", Current),
    describe("Current phase 3", Inverter, "current_3", Current),
    describe("Power", Inverter, "power", Power),
    describe("Energy today", Inverter, "energy_today", Energy),
    describe("Energy total", Inverter, "energy_total", Energy),
    diagnostic(describe("Temperature", Inverter, "temperature", Temperature)),
    diagnostic(describe("Frequency", Inverter, "frequency", Frequency)),
];

pub const SOLAR_SENSORS: &[SensorDescription] = &[
    describe("Voltage string 1", Solar, "voltage_1", Voltage),
    describe("Voltage string 2", Solar, "voltage_2", Voltage),
    describe("Current string 1", Solar, "current_1", Current),
    describe("Current string 2", Solar, "current_2", Current),
    describe("Power string 1", Solar, "power_1", Power),
    describe("Power string 2", Solar, "power_2", Power),
    describe("Power", Solar, "power", Power),
];

pub const BATTERY_SENSORS: &[SensorDescription] = &[
    describe("Voltage", Battery, "voltage", Voltage),
    describe("Current", Battery, "current", Current),
    describe("Power", Battery, "power", Power),
    describe("State of charge", Battery, "state_of_charge", Charge),
    diagnostic(describe("State of health", Battery, "state_of_health", Charge)),
    diagnostic(describe("Temperature", Battery, "temperature", Temperature)),
    describe("Energy in total", Battery, "energy_in_total", Energy),
    describe("Energy out total", Battery, "energy_out_total", Energy),
];

pub const METER_SENSORS: &[SensorDescription] = &[
    describe("Power", Meter, "power", Power),
    describe("Energy import total", Meter, "energy_import_total", Energy),
    describe("Energy export total", Meter, "energy_export_total", Energy),
    describe("Voltage phase 1", Meter, "voltage_1", Voltage),
    describe("Voltage phase 2", Meter, "voltage_2", Voltage),
    describe("Voltage phase 3", Meter, "voltage_3", Voltage),
    describe("Current phase 1", Meter, "current_1", Current),
    describe("Current phase 2", Meter, "current_2", Current),
    describe("Current phase 3", Meter, "current_3", Current),
];

fn slug(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
}

#[derive(Debug, Clone)]
pub struct Sensor {
    pub unique_id: String,
    pub name: String,
    pub device: Device,
    description: &'static SensorDescription,
}

/// Serializable view of a sensor against a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub device_id: String,
    pub device_class: DeviceClass,
    pub unit: &'static str,
    pub state_class: StateClass,
    pub entity_category: Option<EntityCategory>,
    pub available: bool,
    pub state: Option<f64>,
}

impl Sensor {
    /// Sensor for `description`, `None` when `hub` has no such device.
    pub fn new(description: &'static SensorDescription, hub: &Hub) -> Option<Sensor> {
        let device = hub.device(description.device_key)?.clone();

        Some(Sensor {
            unique_id: format!(
                "{}_{}_{}",
                hub.hub_id(),
                description.device_key,
                slug(description.name)
            ),
            name: format!("{} {}", device.name, description.name),
            device,
            description,
        })
    }

    pub fn device_key(&self) -> DeviceKey {
        self.description.device_key
    }

    pub fn data_key(&self) -> &'static str {
        self.description.data_key
    }

    pub fn kind(&self) -> SensorKind {
        self.description.kind
    }

    pub fn unit(&self) -> &'static str {
        self.description.kind.unit()
    }

    pub fn device_class(&self) -> DeviceClass {
        self.description.kind.device_class()
    }

    pub fn state_class(&self) -> StateClass {
        self.description.kind.state_class()
    }

    pub fn entity_category(&self) -> Option<EntityCategory> {
        self.description.entity_category
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.device.device_info()
    }

    /// False when the device or the data key is missing from `snapshot`, or the value is
    /// `None`.
    pub fn available_in(&self, snapshot: &Snapshot) -> bool {
        self.state_in(snapshot).is_some()
    }

    pub fn state_in(&self, snapshot: &Snapshot) -> Option<f64> {
        snapshot.get(self.device_key(), self.data_key())
    }

    pub fn available(&self, coordinator: &Coordinator) -> bool {
        self.state(coordinator).is_some()
    }

    pub fn state(&self, coordinator: &Coordinator) -> Option<f64> {
        current_snapshot(coordinator).and_then(|snapshot| self.state_in(&snapshot))
    }

    pub fn sensor_state(&self, snapshot: Option<&Snapshot>) -> SensorState {
        let state = snapshot.and_then(|s| self.state_in(s));

        SensorState {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            device_id: self.device.id.clone(),
            device_class: self.device_class(),
            unit: self.unit(),
            state_class: self.state_class(),
            entity_category: self.entity_category(),
            available: state.is_some(),
            state,
        }
    }
}

/// Snapshot sensors may read from: the coordinator's data, provided the last refresh
/// succeeded.
pub fn current_snapshot(coordinator: &Coordinator) -> Option<std::sync::Arc<Snapshot>> {
    if coordinator.last_update_success() {
        coordinator.data()
    } else {
        None
    }
}

/// States of all `sensors`, read from one consistent snapshot.
pub fn states(sensors: &[Sensor], coordinator: &Coordinator) -> Vec<SensorState> {
    let snapshot = current_snapshot(coordinator);
    sensors
        .iter()
        .map(|sensor| sensor.sensor_state(snapshot.as_deref()))
        .collect()
}

/// Create sensors for every device of `hub`.
pub fn create_sensors(hub: &Hub) -> Vec<Sensor> {
    [INVERTER_SENSORS, SOLAR_SENSORS, BATTERY_SENSORS, METER_SENSORS]
        .iter()
        .copied()
        .flat_map(|table| table.iter())
        .filter_map(|description| Sensor::new(description, hub))
        .collect()
}
