pub type Endpoint = str;

pub const DEVICE_INFO: &Endpoint = "/getdev.cgi";
pub const DEVICE_DATA: &Endpoint = "/getdevdata.cgi";
