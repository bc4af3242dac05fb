use serde::Deserialize;

/* Device 4: Battery */
#[derive(Debug, Deserialize)]
pub struct GetBatteryData {
    #[serde(rename = "flg")]
    pub flag: Option<u8>,
    #[serde(rename = "tim")]
    pub time: Option<String>,
    /* 0.01 V */
    #[serde(rename = "vb")]
    pub voltage: Option<f64>,
    /* 0.1 A */
    #[serde(rename = "cb")]
    pub current: Option<f64>,
    /* W */
    #[serde(rename = "pb")]
    pub power: Option<f64>,
    /* 0.1 °C */
    #[serde(rename = "tb")]
    pub temperature: Option<f64>,
    /* % */
    #[serde(rename = "soc")]
    pub state_of_charge: Option<f64>,
    /* % */
    #[serde(rename = "soh")]
    pub state_of_health: Option<f64>,
    /* 0.1 kWh */
    #[serde(rename = "ebi")]
    pub energy_in_total: Option<f64>,
    /* 0.1 kWh */
    #[serde(rename = "ebo")]
    pub energy_out_total: Option<f64>,
}
