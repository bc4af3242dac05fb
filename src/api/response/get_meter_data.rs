use serde::Deserialize;

/* Device 3: Meter */
#[derive(Debug, Deserialize)]
pub struct GetMeterData {
    #[serde(rename = "flg")]
    pub flag: Option<u8>,
    #[serde(rename = "tim")]
    pub time: Option<String>,
    /* W, positive when importing from the grid */
    #[serde(rename = "pac")]
    pub power: Option<f64>,
    /* 0.1 kWh */
    #[serde(rename = "iet")]
    pub energy_import_total: Option<f64>,
    /* 0.1 kWh */
    #[serde(rename = "oet")]
    pub energy_export_total: Option<f64>,
    #[serde(rename = "vac", default)]
    pub ac_voltage: Vec<Option<f64>>,
    #[serde(rename = "iac", default)]
    pub ac_current: Vec<Option<f64>>,
}
