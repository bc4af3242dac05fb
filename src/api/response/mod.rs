pub mod device_kind;
pub mod get_battery_data;
pub mod get_device_info;
pub mod get_inverter_data;
pub mod get_meter_data;
