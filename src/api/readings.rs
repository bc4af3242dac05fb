//! Reshaping of raw device payloads into flat `Readings`, converting vendor fixed-point
//! integers into display units (V, A, kW, kWh, %, °C, Hz).

use super::response::get_battery_data::GetBatteryData;
use super::response::get_inverter_data::GetInverterData;
use super::response::get_meter_data::GetMeterData;
use crate::model::Readings;

const DECI: f64 = 0.1;
const CENTI: f64 = 0.01;
const W_TO_KW: f64 = 0.001;

fn round(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn scale(value: Option<f64>, factor: f64) -> Option<f64> {
    value.map(|v| round(v * factor))
}

fn insert(readings: &mut Readings, key: &str, value: Option<f64>) {
    readings.insert(key.to_string(), value);
}

/// Insert one `{prefix}_{n}` reading per phase/string, numbered from 1.
fn insert_indexed(readings: &mut Readings, prefix: &str, values: &[Option<f64>], factor: f64) {
    for (i, value) in values.iter().enumerate() {
        readings.insert(format!("{}_{}", prefix, i + 1), scale(*value, factor));
    }
}

pub fn inverter_readings(data: &GetInverterData) -> Readings {
    let mut readings = Readings::new();

    insert_indexed(&mut readings, "voltage", &data.ac_voltage, DECI);
    insert_indexed(&mut readings, "current", &data.ac_current, DECI);
    insert(&mut readings, "power", scale(data.active_power, W_TO_KW));
    insert(&mut readings, "energy_today", scale(data.energy_today, DECI));
    insert(&mut readings, "energy_total", scale(data.energy_total, DECI));
    insert(&mut readings, "temperature", scale(data.temperature, DECI));
    insert(&mut readings, "frequency", scale(data.frequency, CENTI));

    readings
}

/// PV string readings are carried by the inverter payload.
pub fn solar_readings(data: &GetInverterData) -> Readings {
    let mut readings = Readings::new();

    insert_indexed(&mut readings, "voltage", &data.pv_voltage, DECI);
    insert_indexed(&mut readings, "current", &data.pv_current, CENTI);

    let string_power: Vec<Option<f64>> = data
        .pv_voltage
        .iter()
        .zip(data.pv_current.iter())
        .map(|(v, i)| match (v, i) {
            (Some(v), Some(i)) => Some(v * DECI * i * CENTI * W_TO_KW),
            _ => None,
        })
        .collect();

    for (i, power) in string_power.iter().enumerate() {
        readings.insert(format!("power_{}", i + 1), power.map(round));
    }

    let total = string_power
        .iter()
        .flatten()
        .fold(None, |acc: Option<f64>, p| Some(acc.unwrap_or(0.0) + p));
    insert(&mut readings, "power", total.map(round));

    readings
}

pub fn battery_readings(data: &GetBatteryData) -> Readings {
    let mut readings = Readings::new();

    insert(&mut readings, "voltage", scale(data.voltage, CENTI));
    insert(&mut readings, "current", scale(data.current, DECI));
    insert(&mut readings, "power", scale(data.power, W_TO_KW));
    insert(&mut readings, "state_of_charge", scale(data.state_of_charge, 1.0));
    insert(&mut readings, "state_of_health", scale(data.state_of_health, 1.0));
    insert(&mut readings, "temperature", scale(data.temperature, DECI));
    insert(&mut readings, "energy_in_total", scale(data.energy_in_total, DECI));
    insert(&mut readings, "energy_out_total", scale(data.energy_out_total, DECI));

    readings
}

pub fn meter_readings(data: &GetMeterData) -> Readings {
    let mut readings = Readings::new();

    insert(&mut readings, "power", scale(data.power, W_TO_KW));
    insert(
        &mut readings,
        "energy_import_total",
        scale(data.energy_import_total, DECI),
    );
    insert(
        &mut readings,
        "energy_export_total",
        scale(data.energy_export_total, DECI),
    );
    insert_indexed(&mut readings, "voltage", &data.ac_voltage, DECI);
    insert_indexed(&mut readings, "current", &data.ac_current, DECI);

    readings
}
