use num_derive::FromPrimitive;

/// Device codes understood by the inverter's `device=` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum DeviceKind {
    Inverter = 2,
    Meter = 3,
    Battery = 4,
}

impl DeviceKind {
    pub fn code(self) -> u64 {
        self as u64
    }

    pub fn from_code(code: u64) -> Option<DeviceKind> {
        num::FromPrimitive::from_u64(code)
    }
}
