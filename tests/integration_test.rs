//! End-to-end tests: the real router served on an ephemeral port, with
//! wiremock standing in for upstream destinations.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowbridge::api::{self, AppState};
use flowbridge::config::Config;

/// Build a config whose single route maps the scenario title to `upstream`.
fn test_config(upstream: &str, default_action: &str, route_timeout: u64) -> Config {
    let yaml = format!(
        r#"
general:
  route_timeout: {route_timeout}
  log_rotation: 200mb
server:
  host: 127.0.0.1
  port: 8000
  workers: 1
  log_level: info
filtering:
  default_action: {default_action}
  conditions:
    logic: AND
    rules:
      - field: objectType
        operator: equals
        value: alert
routes:
  - field: object.title
    mappings:
      AP_McAfeeMsme-virusDetected: {upstream}/ep/
"#
    );
    serde_yaml::from_str(&yaml).unwrap()
}

/// Serve the app on an ephemeral port and return its base URL.
async fn spawn_app(config: Config) -> String {
    let state = Arc::new(AppState::new(Arc::new(config)).unwrap());
    let app = api::create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

#[tokio::test]
async fn admitted_document_is_routed_and_upstream_response_surfaced() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ep/"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "objectType": "alert",
            "object": {"title": "AP_McAfeeMsme-virusDetected"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!({
            "objectType": "alert",
            "object": {"title": "AP_McAfeeMsme-virusDetected"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "routed");
    assert_eq!(body["destination_response"]["status_code"], 200);
    assert_eq!(body["destination_response"]["content"], json!({"ok": true}));
    assert_eq!(
        body["routing_summary"]["matched_value"],
        "AP_McAfeeMsme-virusDetected"
    );
    // The response header and body carry the same correlation ID.
    assert_eq!(body["request_id"], Value::String(header_id));
}

#[tokio::test]
async fn dropped_document_returns_processed_and_never_calls_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!({"objectType": "incident"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "processed");
    assert_eq!(body["result"], "dropped");
    assert_eq!(body["filtering_summary"]["default_action_applied"], true);
    assert_eq!(body["filtering_summary"]["matched_rules"], Value::Null);
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn unknown_routing_value_returns_404_with_context() {
    let upstream = MockServer::start().await;
    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!({"objectType": "alert", "object": {"title": "unknown"}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "RoutingError");
    assert_eq!(body["routing_context"]["routing_value"], "unknown");
    assert_eq!(body["routing_context"]["rules_checked"], 1);
    assert_eq!(body["routing_context"]["field_path"], "object.title");
}

#[tokio::test]
async fn slow_upstream_returns_504_timeout_error() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&upstream)
        .await;

    let base = spawn_app(test_config(&upstream.uri(), "drop", 1)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!({
            "objectType": "alert",
            "object": {"title": "AP_McAfeeMsme-virusDetected"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 504);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "ForwardingError");
    assert_eq!(body["forwarding_context"]["error_type"], "TIMEOUT_ERROR");
}

#[tokio::test]
async fn refused_upstream_returns_502_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base = spawn_app(test_config(
        &format!("http://127.0.0.1:{port}"),
        "drop",
        2,
    ))
    .await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!({
            "objectType": "alert",
            "object": {"title": "AP_McAfeeMsme-virusDetected"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "ForwardingError");
    assert_eq!(
        body["forwarding_context"]["error_type"],
        "CONNECTION_ERROR"
    );
}

#[tokio::test]
async fn non_object_payload_returns_400() {
    let upstream = MockServer::start().await;
    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!([1, 2, 3]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "InvalidRequestError");
    assert_eq!(body["message"], "Payload must be a JSON object");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let upstream = MockServer::start().await;
    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .header("content-type", "application/json")
        .body("{\"invalid\": json syntax}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "InvalidRequestError");
}

#[tokio::test]
async fn default_action_pass_routes_unmatched_documents() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ack": 1})))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = spawn_app(test_config(&upstream.uri(), "pass", 2)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!({
            "objectType": "incident",
            "object": {"title": "AP_McAfeeMsme-virusDetected"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "routed");
}

#[tokio::test]
async fn upstream_5xx_is_surfaced_with_edge_status_200() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"busy": true})))
        .mount(&upstream)
        .await;

    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .post(format!("{base}/webhook"))
        .json(&json!({
            "objectType": "alert",
            "object": {"title": "AP_McAfeeMsme-virusDetected"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "routed");
    assert_eq!(body["destination_response"]["status_code"], 503);
    assert_eq!(body["destination_response"]["content"], json!({"busy": true}));
}

#[tokio::test]
async fn health_reports_healthy_with_timestamp_and_request_id() {
    let upstream = MockServer::start().await;
    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn config_endpoint_renders_the_loaded_config() {
    let upstream = MockServer::start().await;
    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .get(format!("{base}/config"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["config"]["general"]["route_timeout"], 2);
    assert_eq!(body["config"]["filtering"]["default_action"], "drop");
    assert_eq!(body["config"]["routes"][0]["field"], "object.title");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn unknown_path_returns_json_404() {
    let upstream = MockServer::start().await;
    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let response = client()
        .get(format!("{base}/nonexistent"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "NotFound");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn request_ids_are_fresh_per_request() {
    let upstream = MockServer::start().await;
    let base = spawn_app(test_config(&upstream.uri(), "drop", 2)).await;

    let mut seen = std::collections::HashSet::new();
    for _ in 0..3 {
        let response = client()
            .get(format!("{base}/health"))
            .header("x-request-id", "caller-supplied")
            .send()
            .await
            .unwrap();
        let body: Value = response.json().await.unwrap();
        let id = body["request_id"].as_str().unwrap().to_string();
        // Inbound X-Request-ID is not honored; a fresh v4 UUID is minted.
        assert_ne!(id, "caller-supplied");
        assert_eq!(id.len(), 36);
        assert!(seen.insert(id));
    }
}

#[tokio::test]
async fn config_file_loading_round_trips_through_the_loader() {
    use std::io::Write;

    let upstream = MockServer::start().await;
    let yaml = format!(
        r#"
general:
  route_timeout: 2
  log_rotation: 200mb
server:
  host: 127.0.0.1
  port: 8000
filtering:
  default_action: drop
  conditions:
    logic: AND
    rules:
      - field: objectType
        operator: equals
        value: alert
routes:
  - field: object.title
    mappings:
      AP_McAfeeMsme-virusDetected: {}/ep/
"#,
        upstream.uri()
    );

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = flowbridge::config::load(file.path()).unwrap();
    let base = spawn_app(config).await;

    let response = client()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
