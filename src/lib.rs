pub mod api;
pub mod device;
pub mod hub;
pub mod model;
pub mod sensor;

pub use api::Error;
