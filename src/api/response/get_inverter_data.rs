use serde::Deserialize;

/* Device 2: Inverter */
#[derive(Debug, Deserialize)]
pub struct GetInverterData {
    #[serde(rename = "flg")]
    pub flag: Option<u8>,
    #[serde(rename = "tim")]
    pub time: Option<String>,
    /* 0.1 °C */
    #[serde(rename = "tmp")]
    pub temperature: Option<f64>,
    /* 0.01 Hz */
    #[serde(rename = "fac")]
    pub frequency: Option<f64>,
    /* W */
    #[serde(rename = "pac")]
    pub active_power: Option<f64>,
    /* 0.1 kWh */
    #[serde(rename = "etd")]
    pub energy_today: Option<f64>,
    /* 0.1 kWh */
    #[serde(rename = "eto")]
    pub energy_total: Option<f64>,
    #[serde(rename = "err")]
    pub error_code: Option<u64>,
    /* 0.1 V per phase */
    #[serde(rename = "vac", default)]
    pub ac_voltage: Vec<Option<f64>>,
    /* 0.1 A per phase */
    #[serde(rename = "iac", default)]
    pub ac_current: Vec<Option<f64>>,
    /* 0.1 V per string */
    #[serde(rename = "vpv", default)]
    pub pv_voltage: Vec<Option<f64>>,
    /* 0.01 A per string */
    #[serde(rename = "ipv", default)]
    pub pv_current: Vec<Option<f64>>,
}
