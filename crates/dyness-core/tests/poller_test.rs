// End-to-end poller tests against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dyness_api::DynessClient;
use dyness_core::{CoreError, Credentials, Poller, PollerConfig};

const DETAIL_PATH: &str = "/v1/device/household/storage/detail";
const POWER_PATH: &str = "/v1/device/getLastPowerDataBySn";
const REALTIME_PATH: &str = "/v1/device/realTime/data";

// ── Helpers ─────────────────────────────────────────────────────────

fn test_config() -> PollerConfig {
    let credentials = Credentials {
        api_id: "test-id".into(),
        api_secret: SecretString::from("test-secret".to_owned()),
    };
    let mut config = PollerConfig::new(credentials, "BMS-1", "DGL-1");
    config.refresh_interval = Duration::ZERO;
    config
}

fn poller_for(server: &MockServer, config: PollerConfig) -> Poller {
    let client = DynessClient::with_base_url(
        "test-id",
        SecretString::from("test-secret".to_owned()),
        server.uri(),
    )
    .unwrap();
    Poller::with_client(config, client)
}

fn ok_body(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": "0", "data": data }))
}

fn api_error() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": "1", "info": "boom" }))
}

async fn mount_detail(server: &MockServer, data: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(DETAIL_PATH))
        .respond_with(ok_body(data))
        .mount(server)
        .await;
}

async fn mount_power(server: &MockServer, data: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(POWER_PATH))
        .respond_with(ok_body(data))
        .mount(server)
        .await;
}

async fn mount_points(server: &MockServer, sn: &str, data: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(REALTIME_PATH))
        .and(body_json(json!({ "deviceSn": sn })))
        .respond_with(ok_body(data))
        .mount(server)
        .await;
}

// ── Full merge ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_merges_all_four_sections() {
    let server = MockServer::start().await;

    mount_detail(&server, json!({ "deviceName": "Tower T10", "firmwareVersion": "1.2.3" })).await;
    mount_power(
        &server,
        json!([
            { "realTimePower": null, "soc": "54" },
            { "realTimePower": "120.5", "soc": "55" },
        ]),
    )
    .await;
    mount_points(
        &server,
        "BMS-1",
        json!([
            { "pointId": "600", "pointValue": "51.2" },
            { "pointId": "1200", "pointValue": "98" },
        ]),
    )
    .await;
    mount_points(
        &server,
        "DGL-1",
        json!([{ "pointId": "800000", "pointValue": "-67" }]),
    )
    .await;

    let poller = poller_for(&server, test_config());
    let snap = poller.refresh().await;

    assert_eq!(snap.device["deviceName"], "Tower T10");
    assert_eq!(snap.power["realTimePower"], "120.5");
    assert_eq!(snap.power["soc"], "55");
    assert_eq!(snap.bms["600"], "51.2");
    assert_eq!(snap.dongle["800000"], "-67");
    assert!(poller.last_error().is_none());

    // Published to readers as well.
    let current = poller.current().expect("snapshot published");
    assert_eq!(current.device["firmwareVersion"], "1.2.3");
}

// ── Failure isolation ───────────────────────────────────────────────

#[tokio::test]
async fn test_partial_failure_degrades_sections_to_empty() {
    let server = MockServer::start().await;

    // Device detail succeeds; everything else is rejected by the API.
    mount_detail(&server, json!({ "deviceName": "Tower T10" })).await;
    Mock::given(method("POST"))
        .and(path(POWER_PATH))
        .respond_with(api_error())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REALTIME_PATH))
        .respond_with(api_error())
        .mount(&server)
        .await;

    let poller = poller_for(&server, test_config());
    let snap = poller.refresh().await;

    // Structurally complete: the failed sections are empty, not absent.
    assert_eq!(snap.device["deviceName"], "Tower T10");
    assert!(snap.power.is_empty());
    assert!(snap.bms.is_empty());
    assert!(snap.dongle.is_empty());

    // One section succeeded, so the cycle did not fail entirely.
    assert!(poller.last_error().is_none());
}

#[tokio::test]
async fn test_all_fetches_failing_sets_last_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(api_error())
        .mount(&server)
        .await;

    let poller = poller_for(&server, test_config());
    let snap = poller.refresh().await;

    assert!(snap.device.is_empty());
    assert!(snap.power.is_empty());
    assert!(snap.bms.is_empty());
    assert!(snap.dongle.is_empty());

    let err = poller.last_error().expect("cycle failed entirely");
    assert!(matches!(*err, CoreError::Api { .. }));
    assert!(err.to_string().contains("boom"));

    // A later healthy cycle clears the indicator.
    server.reset().await;
    mount_detail(&server, json!({ "deviceName": "Tower T10" })).await;
    mount_power(&server, json!([])).await;
    mount_points(&server, "BMS-1", json!([])).await;
    mount_points(&server, "DGL-1", json!([])).await;

    poller.refresh().await;
    assert!(poller.last_error().is_none());
}

#[tokio::test]
async fn test_publication_works_without_any_subscriber() {
    let server = MockServer::start().await;

    mount_detail(&server, json!({ "deviceName": "Tower T10" })).await;
    mount_power(&server, json!([])).await;
    mount_points(&server, "BMS-1", json!([])).await;
    mount_points(&server, "DGL-1", json!([])).await;

    // No subscribe() call anywhere: the watch cells must still retain
    // the published values.
    let poller = poller_for(&server, test_config());
    poller.refresh().await;

    let current = poller.current().expect("snapshot retained with zero receivers");
    assert_eq!(current.device["deviceName"], "Tower T10");
    assert!(poller.last_error().is_none());
}

#[tokio::test]
async fn test_last_error_is_typed_by_failure_kind() {
    // All four fetches rejected by the API: the indicator carries the
    // coded rejection.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(api_error())
        .mount(&server)
        .await;

    let poller = poller_for(&server, test_config());
    poller.refresh().await;
    let err = poller.last_error().expect("cycle failed entirely");
    assert!(matches!(*err, CoreError::Api { ref code, .. } if code == "1"));

    // All four fetches unable to connect: the indicator is a
    // connection failure instead.
    let client = DynessClient::with_base_url(
        "test-id",
        SecretString::from("test-secret".to_owned()),
        "http://127.0.0.1:9",
    )
    .unwrap();
    let poller = Poller::with_client(test_config(), client);
    poller.refresh().await;
    let err = poller.last_error().expect("cycle failed entirely");
    assert!(err.is_connection(), "expected connection error, got: {err:?}");
}

// ── Module serial discovery ─────────────────────────────────────────

#[tokio::test]
async fn test_module_serial_discovered_once() {
    let server = MockServer::start().await;

    mount_detail(&server, json!({})).await;
    mount_power(&server, json!([])).await;
    mount_points(&server, "DGL-1", json!([])).await;

    // First cycle advertises one SUB list...
    Mock::given(method("POST"))
        .and(path(REALTIME_PATH))
        .and(body_json(json!({ "deviceSn": "BMS-1" })))
        .respond_with(ok_body(json!([
            { "pointId": "SUB", "pointValue": " ABC123 , DEF456" }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // ...later cycles advertise a different one.
    mount_points(
        &server,
        "BMS-1",
        json!([{ "pointId": "SUB", "pointValue": "OTHER-9" }]),
    )
    .await;

    let poller = poller_for(&server, test_config());
    assert_eq!(poller.module_sn(), None);

    poller.refresh().await;
    assert_eq!(poller.module_sn().as_deref(), Some("ABC123"));

    // Second cycle must not overwrite the adopted serial.
    poller.refresh().await;
    assert_eq!(poller.module_sn().as_deref(), Some("ABC123"));
}

#[tokio::test]
async fn test_configured_module_serial_wins_over_discovery() {
    let server = MockServer::start().await;

    mount_detail(&server, json!({})).await;
    mount_power(&server, json!([])).await;
    mount_points(
        &server,
        "BMS-1",
        json!([{ "pointId": "SUB", "pointValue": "DISCOVERED-1" }]),
    )
    .await;
    mount_points(&server, "DGL-1", json!([])).await;

    let mut config = test_config();
    config.sn_module = Some("CONFIGURED-1".into());
    let poller = poller_for(&server, config);

    poller.refresh().await;
    assert_eq!(poller.module_sn().as_deref(), Some("CONFIGURED-1"));
}

// ── Verify ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_verify_returns_device_info() {
    let server = MockServer::start().await;
    mount_detail(&server, json!({ "deviceName": "Tower T10", "stationName": "Home" })).await;

    let poller = poller_for(&server, test_config());
    let info = poller.verify().await.unwrap();
    assert_eq!(info["stationName"], "Home");
}

#[tokio::test]
async fn test_verify_propagates_api_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DETAIL_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": "1", "info": "invalid signature" })),
        )
        .mount(&server)
        .await;

    let poller = poller_for(&server, test_config());
    let err = poller.verify().await.unwrap_err();
    match err {
        CoreError::Api { ref code, ref message, .. } => {
            assert_eq!(code, "1");
            assert_eq!(message, "invalid signature");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_verify_distinguishes_connection_failure() {
    let config = test_config();
    let client = DynessClient::with_base_url(
        "test-id",
        SecretString::from("test-secret".to_owned()),
        "http://127.0.0.1:9",
    )
    .unwrap();
    let poller = Poller::with_client(config, client);

    let err = poller.verify().await.unwrap_err();
    assert!(err.is_connection(), "expected connection error, got: {err:?}");
}

// ── Reader surface ──────────────────────────────────────────────────

#[tokio::test]
async fn test_subscribers_observe_whole_snapshot_replacement() {
    let server = MockServer::start().await;

    mount_detail(&server, json!({ "deviceName": "Tower T10" })).await;
    mount_power(&server, json!([])).await;
    mount_points(&server, "BMS-1", json!([])).await;
    mount_points(&server, "DGL-1", json!([])).await;

    let poller = poller_for(&server, test_config());
    let mut rx = poller.subscribe();
    assert!(rx.borrow().is_none());

    poller.refresh().await;

    rx.changed().await.unwrap();
    let snap = rx.borrow_and_update().clone().expect("snapshot");
    assert_eq!(snap.device["deviceName"], "Tower T10");
}

#[tokio::test]
async fn test_start_and_shutdown() {
    let server = MockServer::start().await;

    mount_detail(&server, json!({ "deviceName": "Tower T10" })).await;
    mount_power(&server, json!([])).await;
    mount_points(&server, "BMS-1", json!([])).await;
    mount_points(&server, "DGL-1", json!([])).await;

    let mut config = test_config();
    config.refresh_interval = Duration::from_millis(50);
    let poller = poller_for(&server, config);

    // start() runs the initial refresh before spawning the task.
    poller.start().await.unwrap();
    assert!(poller.current().is_some());

    // Let at least one scheduled cycle run, then stop.
    tokio::time::sleep(Duration::from_millis(120)).await;
    poller.shutdown().await;

    let after = poller.current().expect("snapshot retained after shutdown");
    assert_eq!(after.device["deviceName"], "Tower T10");
}
