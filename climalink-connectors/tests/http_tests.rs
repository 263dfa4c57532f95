//! HTTP collector against a scripted local server

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use climalink_connectors::{CredentialStore, Credentials, HttpCollector, HttpConfig};
use climalink_core::{
    CycleOutcome, DeliveryPort, DeliveryResult, IdentityError, IdentityProvider, MemoryBacklog,
    RawSample, Reading, ReplayCoordinator, SensorError, SensorPort,
};

/// One captured request: lowercased head and raw body
struct Captured {
    head: String,
    body: String,
}

/// Answer one connection per scripted response, in order
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Captured>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let line = line.to_ascii_lowercase();
                if let Some(value) = line.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            captured.push(Captured {
                head,
                body: String::from_utf8(request_body).unwrap(),
            });
        }
        captured
    });

    (base_url, handle)
}

/// Address nothing listens on
fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

fn registered(base_url: &str) -> HttpCollector {
    HttpCollector::new(HttpConfig::new(base_url).timeout_secs(5))
        .unwrap()
        .with_credentials(Credentials {
            sensor_id: "7".into(),
            api_key: "key-123".into(),
            name: "attic".into(),
            location: "Kharkiv".into(),
        })
}

#[test]
fn created_confirms_delivery() {
    let (url, server) = serve(vec![(201, r#"{"message":"Sensor reading recorded","id":1}"#)]);
    let mut collector = registered(&url);

    let result = collector.deliver(&Reading::new(21.5, 48.0, 5).with_pressure(1012.0));
    let requests = server.join().unwrap();

    assert_eq!(result, DeliveryResult::Delivered);
    assert!(requests[0].head.starts_with("post /readings "));
    assert!(requests[0].head.contains("x-api-key: key-123"));
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"temperature": 21.5, "humidity": 48.0, "pressure": 1012.0})
    );
    assert_eq!(collector.stats().messages_sent, 1);
}

#[test]
fn ok_is_not_confirmation() {
    let (url, server) = serve(vec![(200, "{}")]);
    let mut collector = registered(&url);

    let result = collector.deliver(&Reading::new(21.5, 48.0, 5));
    server.join().unwrap();

    assert_eq!(result, DeliveryResult::Rejected("status 200".into()));
}

#[test]
fn error_status_is_rejected() {
    let (url, server) = serve(vec![(403, r#"{"error":"Invalid API Key"}"#)]);
    let mut collector = registered(&url);

    let result = collector.deliver(&Reading::new(21.5, 48.0, 5));
    server.join().unwrap();

    assert_eq!(result, DeliveryResult::Rejected("status 403".into()));
    assert_eq!(collector.stats().messages_failed, 1);
    assert_eq!(collector.stats().last_error.as_deref(), Some("status 403"));
}

#[test]
fn unreachable_collector_is_transport_failure() {
    let mut collector = registered(&closed_url());

    let result = collector.deliver(&Reading::new(21.5, 48.0, 5));

    assert!(matches!(result, DeliveryResult::TransportFailed(_)));
}

#[test]
fn registration_stores_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let creds_path = dir.path().join("credentials.json");
    let (url, server) = serve(vec![(
        201,
        r#"{"id":"a1b2","name":"attic","location":"Kharkiv","api_key":"f00dcafe"}"#,
    )]);

    let mut collector =
        HttpCollector::new(HttpConfig::new(&url).credentials_path(&creds_path)).unwrap();
    assert!(!collector.has_identity());

    let identity = collector.acquire_identity("attic", "Kharkiv").unwrap();
    let requests = server.join().unwrap();

    assert_eq!(identity.sensor_id, "a1b2");
    assert_eq!(identity.api_key, "f00dcafe");
    assert!(requests[0].head.starts_with("post /sensors "));
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, serde_json::json!({"name": "attic", "location": "Kharkiv"}));

    let stored = CredentialStore::new(&creds_path).load().unwrap().unwrap();
    assert_eq!(stored.name, "attic");
    assert_eq!(stored.api_key, "f00dcafe");

    // A restarted collector does not need to register again
    let restarted = HttpCollector::new(HttpConfig::new(&url).credentials_path(&creds_path)).unwrap();
    assert!(restarted.has_identity());
}

#[test]
fn numeric_sensor_id_is_accepted() {
    let (url, server) = serve(vec![(201, r#"{"id":12,"api_key":"f00dcafe"}"#)]);
    let mut collector = HttpCollector::new(HttpConfig::new(&url)).unwrap();

    let identity = collector.acquire_identity("attic", "Kharkiv").unwrap();
    server.join().unwrap();

    assert_eq!(identity.sensor_id, "12");
}

#[test]
fn failed_registration_leaves_sensor_unregistered() {
    let (url, server) = serve(vec![(500, r#"{"error":"Failed to register sensor"}"#)]);
    let mut collector = HttpCollector::new(HttpConfig::new(&url)).unwrap();

    let result = collector.acquire_identity("attic", "Kharkiv");
    server.join().unwrap();

    assert!(matches!(result, Err(IdentityError::Refused(_))));
    assert!(!collector.has_identity());
}

#[test]
fn created_without_key_is_refused() {
    let (url, server) = serve(vec![(201, r#"{"id":"a1b2"}"#)]);
    let mut collector = HttpCollector::new(HttpConfig::new(&url)).unwrap();

    let result = collector.acquire_identity("attic", "Kharkiv");
    server.join().unwrap();

    assert!(matches!(result, Err(IdentityError::Refused(_))));
    assert!(!collector.has_identity());
}

#[test]
fn registration_without_network_is_unreachable() {
    let mut collector = HttpCollector::new(HttpConfig::new(closed_url())).unwrap();

    let result = collector.acquire_identity("attic", "Kharkiv");

    assert!(matches!(result, Err(IdentityError::Unreachable(_))));
}

struct SteadySensor;

impl SensorPort for SteadySensor {
    fn sample(&mut self) -> Result<RawSample, SensorError> {
        Ok(RawSample::new(21.0, 48.0))
    }
}

#[test]
fn coordinator_registers_then_delivers() {
    let (url, server) = serve(vec![
        (201, r#"{"id":"a1b2","api_key":"f00dcafe"}"#),
        (201, r#"{"message":"Sensor reading recorded"}"#),
    ]);
    let collector = HttpCollector::new(HttpConfig::new(&url)).unwrap();
    let mut agent = ReplayCoordinator::new(SteadySensor, collector, MemoryBacklog::new())
        .with_identity("attic", "Kharkiv");

    let outcome = agent.run_cycle();
    let requests = server.join().unwrap();

    assert!(matches!(outcome, CycleOutcome::Delivered { .. }));
    assert!(requests[0].head.starts_with("post /sensors "));
    assert!(requests[1].head.contains("x-api-key: f00dcafe"));
    assert!(agent.backlog().is_empty());
}

#[test]
fn coordinator_buffers_when_collector_refuses() {
    let (url, server) = serve(vec![(503, "{}")]);
    let mut agent = ReplayCoordinator::new(SteadySensor, registered(&url), MemoryBacklog::new());

    let outcome = agent.run_cycle();
    server.join().unwrap();

    assert!(matches!(outcome, CycleOutcome::Buffered { .. }));
    assert_eq!(agent.backlog().len(), 1);
}
