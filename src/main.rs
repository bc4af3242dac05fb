#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use rocket::fairing::AdHoc;
use rocket::http::ContentType;
use rocket::{Build, Rocket, State};
use solplanet_rs::api::{self, Error};
use solplanet_rs::device::Device;
use solplanet_rs::hub::{self, Coordinator, Hub};
use solplanet_rs::sensor::{self, Sensor};
use std::sync::Arc;
use std::time::Duration;

mod metrics;

const DEFAULT_INTERVAL_SECS: i64 = 60;

#[derive(Clone, serde::Deserialize)]
pub struct SolplanetConfig {
    host: String,
    port: u16,
    inverter_id: String,
    name: Option<String>,
    interval: u64,
    timeout: u64,
    meter: bool,
}

/// Structure containing state for API handlers.
pub struct StateData {
    coordinator: Arc<Coordinator>,
    sensors: Vec<Sensor>,
}

pub fn read_settings() -> Result<SolplanetConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .set_default("port", i64::from(api::DEFAULT_PORT))?
        .set_default("interval", DEFAULT_INTERVAL_SECS)?
        .set_default("timeout", hub::DEFAULT_UPDATE_TIMEOUT.as_secs() as i64)?
        .set_default("meter", false)?
        .merge(config::Environment::with_prefix("SOLPLANET"))?;

    validate(settings.try_into()?)
}

fn validate(settings: SolplanetConfig) -> Result<SolplanetConfig, config::ConfigError> {
    if settings.interval == 0 {
        return Err(config::ConfigError::Message(
            "SOLPLANET_INTERVAL must be at least 1 second".to_string(),
        ));
    }
    if settings.timeout == 0 {
        return Err(config::ConfigError::Message(
            "SOLPLANET_TIMEOUT must be at least 1 second".to_string(),
        ));
    }
    Ok(settings)
}

fn build_state(settings: SolplanetConfig) -> Result<StateData, Error> {
    let timeout = Duration::from_secs(settings.timeout);
    let api = api::api(
        &settings.host,
        settings.port,
        settings.inverter_id.clone(),
        timeout,
    )?;
    let hub = Hub::new(api, &settings.inverter_id, settings.name, settings.meter);
    let sensors = sensor::create_sensors(&hub);
    let coordinator = Coordinator::new(hub, Duration::from_secs(settings.interval), timeout);

    Ok(StateData {
        coordinator: Arc::new(coordinator),
        sensors,
    })
}

fn json<T: serde::Serialize>(value: &T) -> Result<(ContentType, String), Error> {
    serde_json::to_string_pretty(value)
        .map(|body| (ContentType::JSON, body))
        .or(Err(Error::FormatError))
}

#[get("/metrics")]
fn metrics_route(state: &State<StateData>) -> Result<String, Error> {
    metrics::update(&state.sensors, &state.coordinator);
    metrics::read()
}

#[get("/sensors")]
fn sensors_route(state: &State<StateData>) -> Result<(ContentType, String), Error> {
    json(&sensor::states(&state.sensors, &state.coordinator))
}

#[get("/devices")]
fn devices_route(state: &State<StateData>) -> Result<(ContentType, String), Error> {
    let devices: Vec<&Device> = state.coordinator.hub().devices().collect();
    json(&devices)
}

#[get("/dump-devices")]
async fn dump_devices_route(state: &State<StateData>) -> Result<(ContentType, String), Error> {
    let dump = state.coordinator.hub().dump_devices().await?;
    json(&dump)
}

fn start_polling(coordinator: Arc<Coordinator>) {
    tokio::spawn(async move {
        if !coordinator.hub().test_connection().await {
            log::warn!(
                "Inverter {} did not answer the connection test, polling anyway",
                coordinator.hub().name()
            );
        }
        coordinator.run().await;
    });
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let state = match read_settings()
        .map_err(|e| e.to_string())
        .and_then(|settings| build_state(settings).map_err(|e| e.to_string()))
    {
        Ok(state) => state,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    rocket::build()
        .manage(state)
        .attach(AdHoc::on_liftoff("Solplanet poller", |rocket| {
            Box::pin(async move {
                match rocket.state::<StateData>() {
                    Some(state) => start_polling(state.coordinator.clone()),
                    None => log::error!("No hub state managed, poller not started"),
                }
            })
        }))
        .mount(
            "/",
            routes![metrics_route, sensors_route, devices_route, dump_devices_route],
        )
}
