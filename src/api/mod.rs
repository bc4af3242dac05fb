pub mod endpoint;
pub mod error;
pub mod readings;
pub mod response;

use crate::model;
pub use error::Error;
use response::device_kind::DeviceKind;
use response::get_battery_data::GetBatteryData;
use response::get_device_info::GetInverterList;
use response::get_inverter_data::GetInverterData;
use response::get_meter_data::GetMeterData;
use serde::de::DeserializeOwned;
use serde_json::Value;

use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8484;

/// Build the base URL of the inverter's local web server. A `host` that already carries a
/// scheme is used as is.
fn base_url(host: &str, port: u16) -> String {
    if host.contains("://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("http://{}:{}", host, port)
    }
}

pub fn api(
    host: &str,
    port: u16,
    serial_number: String,
    timeout: Duration,
) -> Result<model::Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .or(Err(Error::InternalError))?;

    Ok(model::Api {
        base_url: base_url(host, port),
        serial_number,
        client,
    })
}

/// Map failed request or non-2xx response to Error
fn map_api_err(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        return Error::Timeout;
    }
    match error.status() {
        /* the web server answers 404 for device codes it does not know about */
        Some(http::StatusCode::NOT_FOUND) => Error::UnexpectedApiResponse,
        Some(_) => Error::ApiError(error.to_string()),
        None if error.is_connect() => Error::ConnectionError(error.to_string()),
        None => Error::ApiError(error.to_string()),
    }
}

fn device_query(api: &model::Api, kind: DeviceKind) -> Vec<(&'static str, String)> {
    match kind {
        DeviceKind::Meter => vec![("device", kind.code().to_string())],
        _ => vec![
            ("device", kind.code().to_string()),
            ("sn", api.serial_number.to_owned()),
        ],
    }
}

async fn get(
    api: &model::Api,
    endpoint: &endpoint::Endpoint,
    query: &[(&'static str, String)],
) -> Result<Value, Error> {
    let url = format!("{}{}", api.base_url, endpoint);

    let response_text = api
        .client
        .get(url)
        .query(query)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(map_api_err)?
        .text()
        .await
        .map_err(|e| Error::ApiError(format!("Error reading API response: {}", e)))?;

    log::trace!(
        "endpoint: {}, query: {:?}, response_text: {}",
        endpoint,
        query,
        response_text
    );

    serde_json::from_str::<Value>(&response_text)
        .map_err(|e| Error::InvalidResponse(response_text, e.to_string()))
}

async fn device_data<T: DeserializeOwned>(
    api: &model::Api,
    kind: DeviceKind,
) -> Result<T, Error> {
    get(api, endpoint::DEVICE_DATA, &device_query(api, kind))
        .await
        .map(serde_json::from_value::<T>)?
        .or(Err(Error::UnexpectedApiResponse))
}

/// Read the inverter payload (`device=2`).
pub async fn inverter_data(api: &model::Api) -> Result<GetInverterData, Error> {
    device_data(api, DeviceKind::Inverter).await
}

/// Read the battery payload (`device=4`).
pub async fn battery_data(api: &model::Api) -> Result<GetBatteryData, Error> {
    device_data(api, DeviceKind::Battery).await
}

/// Read the meter payload (`device=3`).
pub async fn meter_data(api: &model::Api) -> Result<GetMeterData, Error> {
    device_data(api, DeviceKind::Meter).await
}

/// List inverters known to the local web server.
pub async fn inverters(api: &model::Api) -> Result<GetInverterList, Error> {
    get(
        api,
        endpoint::DEVICE_INFO,
        &[("device", DeviceKind::Inverter.code().to_string())],
    )
    .await
    .map(serde_json::from_value::<GetInverterList>)?
    .or(Err(Error::UnexpectedApiResponse))
}

/// Dump devices
///
/// Collect raw JSON of device info and device data for each of `codes`, for reporting
/// field mappings of firmware versions not yet covered. Unknown codes are rejected before
/// any request is made.
pub async fn dump_devices(
    api: &model::Api,
    codes: &[u64],
) -> Result<BTreeMap<String, Value>, Error> {
    let mut dump = BTreeMap::new();

    for &code in codes {
        let kind = DeviceKind::from_code(code).ok_or(Error::UnknownDeviceKind(code))?;

        match get(api, endpoint::DEVICE_INFO, &[("device", code.to_string())]).await {
            Ok(value) => {
                dump.insert(format!("getdev_{}", code), value);
            }
            Err(e) => log::warn!("No device info returned for device {}: {}", code, e),
        }

        let value = get(api, endpoint::DEVICE_DATA, &device_query(api, kind)).await?;
        dump.insert(format!("getdevdata_{}", code), value);
    }

    Ok(dump)
}
