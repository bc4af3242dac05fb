use solplanet_rs::api;
use solplanet_rs::device::DeviceKey;
use solplanet_rs::hub::{Coordinator, Hub};
use solplanet_rs::sensor;
use solplanet_rs::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn read_resource(filename: &str) -> String {
    let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    d.push(format!("resources/test/{}", filename));
    fs::read_to_string(d.as_path()).unwrap()
}

/// Switches and counters shared with the canned server.
#[derive(Default)]
struct Inverter {
    offline: AtomicBool,
    no_inverters: AtomicBool,
    data_requests: AtomicUsize,
}

/// Canned body for a request line, `None` answers 404.
fn route(inverter: &Inverter, request_line: &str) -> Option<String> {
    let path = request_line.split_whitespace().nth(1)?;

    if path.starts_with("/getdevdata.cgi?device=2&sn=SP00012345") {
        inverter.data_requests.fetch_add(1, Ordering::SeqCst);
        Some(read_resource("getInverterData.json"))
    } else if path.starts_with("/getdevdata.cgi?device=4&sn=SP00012345") {
        Some(read_resource("getBatteryData.json"))
    } else if path.starts_with("/getdevdata.cgi?device=3") {
        Some(read_resource("getMeterData.json"))
    } else if path.starts_with("/getdev.cgi?device=2") {
        if inverter.no_inverters.load(Ordering::SeqCst) {
            Some(r#"{"inv":[],"num":0}"#.to_string())
        } else {
            Some(read_resource("getInverterList.json"))
        }
    } else {
        None
    }
}

async fn serve() -> String {
    serve_inverter(Arc::new(Inverter::default())).await
}

/// Serve canned inverter payloads on a local port, one request per connection. Every
/// request fails with 500 while the inverter is offline.
async fn serve_inverter(inverter: Arc<Inverter>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let inverter = inverter.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request).to_string();
                let request_line = request.lines().next().unwrap_or_default();

                let response = if inverter.offline.load(Ordering::SeqCst) {
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                } else {
                    match route(&inverter, request_line) {
                        Some(body) => format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ),
                        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_string(),
                    }
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// Accept connections and never answer them.
async fn serve_silence() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}", addr)
}

/// Address nothing listens on.
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn hub(base_url: &str, serial_number: &str, meter: bool) -> Hub {
    let api = api::api(
        base_url,
        api::DEFAULT_PORT,
        serial_number.to_string(),
        Duration::from_secs(2),
    )
    .unwrap();
    Hub::new(api, serial_number, None, meter)
}

#[tokio::test]
async fn fetch_data_reshapes_all_devices() {
    let url = serve().await;
    let hub = hub(&url, "SP00012345", true);

    let snapshot = hub.fetch_data().await.unwrap();

    assert_eq!(Some(230.4), snapshot.get(DeviceKey::Inverter, "voltage_1"));
    assert_eq!(Some(1.523), snapshot.get(DeviceKey::Inverter, "power"));
    assert_eq!(Some(1.603), snapshot.get(DeviceKey::Solar, "power"));
    assert_eq!(Some(87.0), snapshot.get(DeviceKey::Battery, "state_of_charge"));
    assert_eq!(Some(-0.85), snapshot.get(DeviceKey::Meter, "power"));
}

#[tokio::test]
async fn failing_device_is_left_out() {
    let url = serve().await;
    /* battery and inverter answer 404 for an unknown serial number, the meter does not care */
    let hub = hub(&url, "OTHER", true);

    let snapshot = hub.fetch_data().await.unwrap();

    assert!(snapshot.readings(DeviceKey::Inverter).is_none());
    assert!(snapshot.readings(DeviceKey::Battery).is_none());
    assert_eq!(Some(305.0), snapshot.get(DeviceKey::Meter, "energy_import_total"));
}

#[tokio::test]
async fn fetch_data_fails_when_nothing_answers() {
    let url = serve().await;
    let hub = hub(&url, "OTHER", false);

    assert_eq!(Err(Error::UnexpectedApiResponse), hub.fetch_data().await.map(|_| ()));
}

#[tokio::test]
async fn connection_test() {
    let url = serve().await;
    assert!(hub(&url, "SP00012345", false).test_connection().await);

    let url = closed_port().await;
    assert!(!hub(&url, "SP00012345", false).test_connection().await);
}

#[tokio::test]
async fn connection_test_needs_an_inverter() {
    let inverter = Arc::new(Inverter::default());
    inverter.no_inverters.store(true, Ordering::SeqCst);
    let url = serve_inverter(inverter).await;

    assert!(!hub(&url, "SP00012345", false).test_connection().await);
}

#[tokio::test]
async fn dump_devices() {
    let url = serve().await;
    let dump = hub(&url, "SP00012345", false).dump_devices().await.unwrap();

    assert_eq!(Some(1523), dump["getdevdata_2"]["pac"].as_u64());
    assert_eq!("SP00012345", dump["getdev_2"]["inv"][0]["isn"]);
    assert!(dump.contains_key("getdevdata_4"));
    assert!(!dump.contains_key("getdevdata_3"));
}

#[tokio::test]
async fn sensors_follow_coordinator() {
    let url = serve().await;
    let coordinator = Coordinator::new(
        hub(&url, "SP00012345", false),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );
    let sensors = sensor::create_sensors(coordinator.hub());
    let soc = sensors
        .iter()
        .find(|s| s.unique_id == "sp00012345_battery_state_of_charge")
        .unwrap();

    assert!(!soc.available(&coordinator));

    coordinator.refresh().await.unwrap();

    assert!(coordinator.last_update_success());
    assert!(coordinator.since_last_update().is_some());
    assert!(soc.available(&coordinator));
    assert_eq!(Some(87.0), soc.state(&coordinator));

    let states = sensor::states(&sensors, &coordinator);
    let health = states
        .iter()
        .find(|s| s.unique_id == "sp00012345_battery_state_of_health")
        .unwrap();
    assert!(!health.available);
}

#[tokio::test]
async fn first_refresh_failure_leaves_no_data() {
    let coordinator = Coordinator::new(
        hub(&closed_port().await, "SP00012345", false),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );

    assert!(coordinator.refresh().await.is_err());
    assert!(!coordinator.last_update_success());
    assert!(coordinator.data().is_none());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let inverter = Arc::new(Inverter::default());
    let url = serve_inverter(inverter.clone()).await;
    let coordinator = Coordinator::new(
        hub(&url, "SP00012345", false),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );
    let sensors = sensor::create_sensors(coordinator.hub());

    let first = coordinator.refresh().await.unwrap();
    assert!(sensors.iter().any(|s| s.available(&coordinator)));

    inverter.offline.store(true, Ordering::SeqCst);
    match coordinator.refresh().await {
        Err(Error::ApiError(_)) => {}
        other => panic!("unexpected refresh result: {:?}", other.map(|_| ())),
    }

    assert!(!coordinator.last_update_success());
    assert!(Arc::ptr_eq(&first, &coordinator.data().unwrap()));
    assert!(sensors.iter().all(|s| !s.available(&coordinator)));

    inverter.offline.store(false, Ordering::SeqCst);
    coordinator.refresh().await.unwrap();
    assert!(coordinator.last_update_success());
    assert!(!Arc::ptr_eq(&first, &coordinator.data().unwrap()));
}

#[tokio::test]
async fn refresh_times_out_on_silent_inverter() {
    let coordinator = Coordinator::new(
        hub(&serve_silence().await, "SP00012345", false),
        Duration::from_secs(60),
        Duration::from_millis(200),
    );

    assert_eq!(Err(Error::Timeout), coordinator.refresh().await.map(|_| ()));
    assert!(!coordinator.last_update_success());
    assert!(coordinator.data().is_none());
}

#[tokio::test]
async fn run_polls_immediately_then_every_interval() {
    let inverter = Arc::new(Inverter::default());
    let url = serve_inverter(inverter.clone()).await;
    let coordinator = Arc::new(Coordinator::new(
        hub(&url, "SP00012345", false),
        Duration::from_secs(1),
        Duration::from_millis(500),
    ));
    let poller = tokio::spawn(coordinator.clone().run());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(1, inverter.data_requests.load(Ordering::SeqCst));
    assert!(coordinator.last_update_success());
    let first = coordinator.data().unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(2, inverter.data_requests.load(Ordering::SeqCst));
    assert!(!Arc::ptr_eq(&first, &coordinator.data().unwrap()));

    poller.abort();
}
