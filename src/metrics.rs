use prometheus::{Encoder, GaugeVec, TextEncoder};
use solplanet_rs::hub::Coordinator;
use solplanet_rs::model::Snapshot;
use solplanet_rs::sensor::Sensor;
use std::time::UNIX_EPOCH;

lazy_static! {
    static ref SENSOR_VALUE_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "solplanet_sensor_value",
            "current value of a sensor, in the unit given by the `unit` label",
        ),
        &["hub_id", "device", "sensor", "unit"],
    )
    .unwrap();
    static ref SENSOR_AVAILABLE_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "solplanet_sensor_available",
            "1 when the sensor has a value in the latest snapshot",
        ),
        &["hub_id", "device", "sensor", "unit"],
    )
    .unwrap();
    static ref LAST_UPDATE_SUCCESS_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "solplanet_last_update_success",
            "1 when the last poll of the inverter succeeded",
        ),
        &["hub_id"],
    )
    .unwrap();
    static ref LAST_UPDATE_TIMESTAMP_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "solplanet_last_update_timestamp_seconds",
            "unix time at which the current snapshot was taken",
        ),
        &["hub_id"],
    )
    .unwrap();
}

/// Feed sensor states read from `snapshot` to Prometheus metrics. Values of unavailable
/// sensors are removed rather than left at their last reading.
fn publish(hub_id: &str, sensors: &[Sensor], snapshot: Option<&Snapshot>, success: bool) {
    LAST_UPDATE_SUCCESS_GAUGE
        .with_label_values(&[hub_id])
        .set(if success { 1.0 } else { 0.0 });

    if let Some(taken_at) = snapshot.and_then(|s| s.taken_at.duration_since(UNIX_EPOCH).ok()) {
        LAST_UPDATE_TIMESTAMP_GAUGE
            .with_label_values(&[hub_id])
            .set(taken_at.as_secs_f64());
    }

    let readable = if success { snapshot } else { None };

    for sensor in sensors {
        let labels = [
            hub_id,
            sensor.device_key().as_str(),
            sensor.unique_id.as_str(),
            sensor.unit(),
        ];
        let state = readable.and_then(|s| sensor.state_in(s));

        SENSOR_AVAILABLE_GAUGE
            .with_label_values(&labels)
            .set(if state.is_some() { 1.0 } else { 0.0 });

        match state {
            Some(value) => SENSOR_VALUE_GAUGE.with_label_values(&labels).set(value),
            None => {
                if SENSOR_VALUE_GAUGE.remove_label_values(&labels).is_err() {
                    log::trace!("No previous value for {}", sensor.unique_id);
                }
            }
        }
    }
}

/// Update metrics of every sensor from the coordinator's current state.
pub fn update(sensors: &[Sensor], coordinator: &Coordinator) {
    let snapshot = coordinator.data();

    publish(
        coordinator.hub().hub_id(),
        sensors,
        snapshot.as_deref(),
        coordinator.last_update_success(),
    );
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, solplanet_rs::Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(solplanet_rs::Error::FormatError))?;
    String::from_utf8(buffer).or(Err(solplanet_rs::Error::FormatError))
}
