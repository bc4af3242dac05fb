use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InverterInfo {
    #[serde(rename = "isn")]
    pub serial_number: String,
    #[serde(rename = "add")]
    pub address: Option<u64>,
    pub model: Option<String>,
    #[serde(rename = "msw")]
    pub master_firmware: Option<String>,
    #[serde(rename = "err")]
    pub error_code: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct GetInverterList {
    #[serde(rename = "inv")]
    pub inverters: Vec<InverterInfo>,
    pub num: Option<u64>,
}
