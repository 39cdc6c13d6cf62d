#![allow(clippy::unwrap_used)]
// Integration tests for `DomoticzClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use domosync_api::{Credentials, DeviceFilter, DomoticzClient, Error, Reading};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DomoticzClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = DomoticzClient::with_client(reqwest::Client::new(), base_url, None);
    (server, client)
}

fn devices_envelope(devices: serde_json::Value) -> serde_json::Value {
    json!({ "status": "OK", "title": "Devices", "result": devices })
}

// ── Device listing ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .and(query_param("type", "devices"))
        .and(query_param("filter", "all"))
        .and(query_param("used", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_envelope(json!([
            {
                "idx": "12",
                "Name": "Gas meter",
                "Type": "P1 Smart Meter",
                "SubType": "Gas",
                "CounterToday": "1.234 m3",
                "Data": "4567.890",
                "LastUpdate": "2024-06-15 10:30:00"
            },
            {
                "idx": 13,
                "Name": "Living room",
                "Type": "Temp + Humidity",
                "SubType": "THGN122/123/132",
                "Temp": 21.4,
                "Humidity": 48,
                "LastUpdate": "2024-06-15 10:29:12"
            }
        ]))))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].idx, "12");
    assert_eq!(devices[0].sub_type.as_deref(), Some("Gas"));
    assert_eq!(devices[0].counter_today, Some(Reading::Text("1.234 m3".into())));
    assert_eq!(devices[1].idx, "13");
    assert_eq!(devices[1].temp, Some(Reading::Number(21.4)));
}

#[tokio::test]
async fn test_list_devices_skips_malformed_entries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .and(query_param("type", "devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_envelope(json!([
            { "idx": "1", "Type": "Temp", "Temp": 21.5 },
            { "idx": "2", "SubType": "Fan", "Data": 1200 },
            { "Name": "No identifier" },
            { "idx": { "nested": true } }
        ]))))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].idx, "1");
    assert_eq!(devices[0].temp, Some(Reading::Number(21.5)));
    assert_eq!(devices[1].idx, "2");
    assert_eq!(devices[1].data.as_deref(), Some("1200"));
}

#[tokio::test]
async fn test_list_devices_empty_result() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "OK", "title": "Devices" })),
        )
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_find_devices_filters_sub_type_client_side() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .and(query_param("filter", "utility"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_envelope(json!([
            { "idx": "1", "Type": "P1 Smart Meter", "SubType": "Gas" },
            { "idx": "2", "Type": "P1 Smart Meter", "SubType": "Energy" }
        ]))))
        .mount(&server)
        .await;

    let filter = DeviceFilter::all().with_kind("utility").with_sub_type("Energy");
    let devices = client.find_devices(&filter).await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].idx, "2");
}

#[tokio::test]
async fn test_get_device_by_idx() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .and(query_param("rid", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_envelope(json!([
            { "idx": "42", "Name": "Boiler", "Type": "Thermostat", "SubType": "SetPoint", "SetPoint": "20.5" }
        ]))))
        .mount(&server)
        .await;

    let device = client.get_device("42").await.unwrap().unwrap();
    assert_eq!(device.name.as_deref(), Some("Boiler"));
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_err_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ERR", "message": "Invalid filter" })),
        )
        .mount(&server)
        .await;

    let result = client.list_devices().await;
    assert!(
        matches!(result, Err(Error::Api { ref message }) if message == "Invalid filter"),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_devices().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let result = client.list_devices().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_switch_command() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .and(query_param("type", "command"))
        .and(query_param("param", "switchlight"))
        .and(query_param("idx", "7"))
        .and(query_param("switchcmd", "On"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "OK", "title": "SwitchLight" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.update_device("switch", "7", "On", None).await.unwrap();
}

#[tokio::test]
async fn test_setpoint_command() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .and(query_param("param", "setsetpoint"))
        .and(query_param("idx", "42"))
        .and(query_param("setpoint", "21.5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "OK", "title": "SetSetpoint" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client
        .update_device("set-setpoint", "42", "21.5", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_command_is_rejected_locally() {
    let (_server, client) = setup().await;

    let result = client.update_device("explode", "1", "now", None).await;
    assert!(matches!(result, Err(Error::UnsupportedCommand(ref c)) if c == "explode"));
}

// ── Credentials ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_check_credentials_sends_basic_auth() {
    let server = MockServer::start().await;
    let credentials = Credentials::new("admin", SecretString::from("secret".to_string()));
    let client = DomoticzClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Some(credentials),
    );

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .and(query_param("param", "getversion"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "title": "GetVersion",
            "version": "2024.7",
            "Revision": 16201,
            "build_time": "2024-07-14 10:12:11"
        })))
        .mount(&server)
        .await;

    let version = client.check_credentials().await.unwrap();
    assert_eq!(version.version.as_deref(), Some("2024.7"));
    assert_eq!(version.revision, Some(16201));
}

#[tokio::test]
async fn test_check_credentials_login_err() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/json.htm"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ERR", "title": "Login required" })),
        )
        .mount(&server)
        .await;

    let result = client.check_credentials().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}
