#![allow(clippy::unwrap_used)]
// End-to-end export runs against a mock REST API.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metricsnap_core::{
    CoreError, Credentials, ExportConfig, Exporter, FanoutLimits, ReportFormat, Reporter, Schedule,
    TimeWindow,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// `Write` target that can be read back after the reporter is done.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn page(content: serde_json::Value) -> serde_json::Value {
    let total = content.as_array().map_or(0, Vec::len);
    json!({
        "totalElements": total,
        "content": content,
        "pageNumber": 0,
        "pageSize": 10000,
        "totalPages": 1
    })
}

fn config(server: &MockServer, schedule: Schedule) -> ExportConfig {
    let url = Url::parse(&format!("{}/api/v2/", server.uri())).unwrap();
    let mut config = ExportConfig::new(url, Credentials::new("admin", "s3cret".to_string().into()));
    config.schedule = schedule;
    config.timeout = Duration::from_secs(5);
    config
}

fn window() -> TimeWindow {
    TimeWindow::trailing(1_700_000_300_000, Duration::from_secs(300))
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/authentication/signin"))
        .and(query_param("nmsLogin", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc123" })))
        .expect(1)
        .mount(server)
        .await;
}

/// router1 (7) → eth0 (1), eth1 (2) → three indicators each, one sample of
/// 42.0 per indicator.
async fn mount_tree(server: &MockServer) {
    mount_sign_in(server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices"))
        .and(header("x-auth-token", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            { "id": 7, "name": "router1", "ipAddress": "10.0.0.1" }
        ]))))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices/7/objects"))
        .and(header("x-auth-token", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            { "id": 1, "deviceId": 7, "name": "eth0" },
            { "id": 2, "deviceId": 7, "name": "eth1" }
        ]))))
        .mount(server)
        .await;

    for object in [1_i64, 2] {
        let indicators: Vec<_> = ["ifInOctets", "ifOutOctets", "ifErrors"]
            .iter()
            .enumerate()
            .map(|(n, name)| {
                json!({
                    "id": object * 10 + i64::try_from(n).unwrap() + 1,
                    "deviceId": 7,
                    "objectId": object,
                    "name": name
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/devices/7/objects/{object}/indicators")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page(serde_json::Value::from(indicators))),
            )
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v2/devices/7/objects/\d+/indicators/\d+/data$"))
        .and(query_param("startTime", "1700000000000"))
        .and(query_param("endTime", "1700000300000"))
        .and(header("x-auth-token", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "value": 42.0, "time": 1_700_000_290_000_i64, "focus": 0 }
        ])))
        .expect(6)
        .mount(server)
        .await;
}

async fn export(
    server: &MockServer,
    schedule: Schedule,
    format: ReportFormat,
) -> (Result<metricsnap_core::ExportSummary, CoreError>, String) {
    let config = config(server, schedule);
    let buf = SharedBuf::default();
    let reporter = Arc::new(Reporter::new(buf.clone(), format));
    let exporter = Exporter::connect(&config, reporter).unwrap();
    let result = exporter.run_window(&config.credentials, window()).await;
    (result, buf.contents())
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sequential_export_writes_keyed_report() {
    let server = MockServer::start().await;
    mount_tree(&server).await;

    let (result, out) = export(&server, Schedule::Sequential, ReportFormat::Keyed).await;
    let summary = result.unwrap();

    assert_eq!(summary.samples, 6);
    assert_eq!(
        out,
        "{\n\
         \x20 \"ifInOctets|ST[device:router1,object:eth0\": \"42.000000\",\n\
         \x20 \"ifOutOctets|ST[device:router1,object:eth0\": \"42.000000\",\n\
         \x20 \"ifErrors|ST[device:router1,object:eth0\": \"42.000000\",\n\
         \x20 \"ifInOctets|ST[device:router1,object:eth1\": \"42.000000\",\n\
         \x20 \"ifOutOctets|ST[device:router1,object:eth1\": \"42.000000\",\n\
         \x20 \"ifErrors|ST[device:router1,object:eth1\": \"42.000000\",\n\
         }\n"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_export_writes_every_line() {
    let server = MockServer::start().await;
    mount_tree(&server).await;

    let (result, out) = export(&server, Schedule::default(), ReportFormat::Dotted).await;
    assert!(result.unwrap().is_complete());

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.first(), Some(&"{"));
    assert_eq!(lines.last(), Some(&"}"));

    let mut samples = lines[1..lines.len() - 1].to_vec();
    samples.sort_unstable();
    assert_eq!(
        samples,
        vec![
            "router1.eth0.ifErrors: 42.000000",
            "router1.eth0.ifInOctets: 42.000000",
            "router1.eth0.ifOutOctets: 42.000000",
            "router1.eth1.ifErrors: 42.000000",
            "router1.eth1.ifInOctets: 42.000000",
            "router1.eth1.ifOutOctets: 42.000000",
        ]
    );
}

#[tokio::test]
async fn empty_device_listing_is_fatal() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let (result, out) = export(&server, Schedule::default(), ReportFormat::Keyed).await;

    match result {
        Err(CoreError::DeviceListing { source }) => {
            assert!(matches!(source, metricsnap_api::Error::EmptyResponse { .. }));
        }
        other => panic!("expected DeviceListing, got: {other:?}"),
    }
    assert_eq!(out, "");
}

#[tokio::test]
async fn rejected_sign_in_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/authentication/signin"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (result, out) = export(&server, Schedule::default(), ReportFormat::Keyed).await;

    assert!(matches!(result, Err(CoreError::Authentication { .. })));
    assert_eq!(out, "");
}

#[tokio::test]
async fn object_failure_skips_only_that_device() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            { "id": 7, "name": "router1" },
            { "id": 8, "name": "router2" }
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/devices/7/objects"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/devices/8/objects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            { "id": 1, "deviceId": 8, "name": "eth0" }
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/devices/8/objects/1/indicators"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            { "id": 5, "deviceId": 8, "objectId": 1, "name": "cpu" }
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/devices/8/objects/1/indicators/5/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let (result, out) = export(&server, Schedule::default(), ReportFormat::Dotted).await;
    let summary = result.unwrap();

    assert_eq!(summary.devices, 2);
    assert_eq!(summary.objects, 1);
    assert_eq!(summary.indicators, 1);
    assert_eq!(summary.samples, 0);
    assert_eq!(summary.failed_fetches, 1);
    assert_eq!(out, "{\n}\n");
}

#[test]
fn zero_concurrency_limit_is_rejected() {
    let server_url = Url::parse("http://127.0.0.1:9/api/v2/").unwrap();
    let mut config = ExportConfig::new(server_url, Credentials::new("a", "b".to_string().into()));
    config.schedule = Schedule::Bounded(FanoutLimits {
        devices: 0,
        ..FanoutLimits::default()
    });

    let reporter = Arc::new(Reporter::new(Vec::new(), ReportFormat::Keyed));
    let err = Exporter::connect(&config, reporter).err().unwrap();
    assert!(matches!(err, CoreError::Config { .. }));
}
