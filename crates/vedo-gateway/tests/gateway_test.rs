#![allow(clippy::unwrap_used)]
// End-to-end routes: router -> Vedo facade -> HTTP panel mocked with wiremock.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::AsyncReadExt;
use tower::util::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vedo_core::{PanelConfig, Vedo};
use vedo_gateway::router;

// ── Helpers ─────────────────────────────────────────────────────────

fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Two areas (house armed, garage disarmed) and two zones, one per area.
async fn mock_panel() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login.cgi"))
        .respond_with(ok(json!({ "logged": 1, "life": 300 })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/area_desc.json"))
        .respond_with(ok(json!({
            "logged": 1,
            "present": [1, 1],
            "description": ["Casa", "Garage"]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/area_stat.json"))
        .respond_with(ok(json!({
            "logged": 1,
            "ready": [1, 1],
            "armed": [4, 0],
            "alarm": [0, 0]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/zone_desc.json"))
        .respond_with(ok(json!({
            "logged": 1,
            "present": [1, 1, 0],
            "in_area": [1, 2, 0],
            "description": ["Porta", "Basculante", ""]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/zone_stat.json"))
        .respond_with(ok(json!({ "logged": 1, "status": "0001,0080,0000" })))
        .mount(&server)
        .await;

    server
}

fn config(uri: &str) -> PanelConfig {
    PanelConfig::new(Url::parse(uri).unwrap(), "123456".to_string().into())
}

async fn connected_app(server: &MockServer) -> Router {
    let vedo = Vedo::new(&config(&server.uri())).unwrap();
    vedo.connect().await.unwrap();
    router(vedo)
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ── Status routes ───────────────────────────────────────────────────

#[tokio::test]
async fn general_status_reports_code_and_name() {
    let server = mock_panel().await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::GET, "/vedo/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 3, "description": "PartialActive" }));
}

#[tokio::test]
async fn areas_use_camel_case_fields() {
    let server = mock_panel().await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::GET, "/vedo/areas").await;

    assert_eq!(status, StatusCode::OK);
    let areas = body.as_array().unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0]["name"], "Casa");
    assert_eq!(areas[0]["status"], 2);
    assert_eq!(areas[0]["armed"], true);
    assert_eq!(areas[1]["alarmMemory"], false);
}

#[tokio::test]
async fn single_area_and_missing_area() {
    let server = mock_panel().await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::GET, "/vedo/areas/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Garage");

    let (status, body) = call(&app, Method::GET, "/vedo/areas/7").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn is_active_per_area_and_for_all() {
    let server = mock_panel().await;
    let app = connected_app(&server).await;

    assert_eq!(
        call(&app, Method::GET, "/vedo/areas/0/is-active").await.1,
        json!(true)
    );
    assert_eq!(
        call(&app, Method::GET, "/vedo/areas/1/is-active").await.1,
        json!(false)
    );
    assert_eq!(
        call(&app, Method::GET, "/vedo/areas/all/is-active").await.1,
        json!(true)
    );
}

#[tokio::test]
async fn zones_filtered_by_area() {
    let server = mock_panel().await;
    let app = connected_app(&server).await;

    let (_, all) = call(&app, Method::GET, "/vedo/areas/all/zones").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, garage) = call(&app, Method::GET, "/vedo/areas/1/zones").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        garage,
        json!([{
            "id": 1,
            "areaId": 1,
            "name": "Basculante",
            "excluded": true,
            "isolated": false,
            "open": false,
            "triggered": false
        }])
    );
}

#[tokio::test]
async fn bad_area_segment_is_bad_request() {
    let server = mock_panel().await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::GET, "/vedo/areas/garage/zones").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("garage"));
}

// ── Command routes ──────────────────────────────────────────────────

#[tokio::test]
async fn arm_sends_total_arming_for_area() {
    let server = mock_panel().await;
    Mock::given(method("GET"))
        .and(path("/action.cgi"))
        .and(query_param("tot", "1"))
        .respond_with(ok(json!({ "logged": 1, "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::POST, "/vedo/areas/1/arm").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));
}

#[tokio::test]
async fn toggle_disarms_an_armed_area() {
    let server = mock_panel().await;
    Mock::given(method("GET"))
        .and(path("/action.cgi"))
        .and(query_param("dis", "0"))
        .respond_with(ok(json!({ "logged": 1, "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::POST, "/vedo/areas/0/arm-disarm").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(false), "area 0 was armed, so it ends disarmed");
}

#[tokio::test]
async fn zone_exclude_accepts_duplicate() {
    let server = mock_panel().await;
    Mock::given(method("GET"))
        .and(path("/action.cgi"))
        .and(query_param("excl", "1"))
        .respond_with(ok(json!({ "logged": 1, "result": "already" })))
        .expect(1)
        .mount(&server)
        .await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::POST, "/vedo/zones/1/exclude").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));
}

#[tokio::test]
async fn rejected_command_is_bad_request() {
    let server = mock_panel().await;
    Mock::given(method("GET"))
        .and(path("/action.cgi"))
        .respond_with(ok(json!({
            "logged": 1,
            "result": "error",
            "reason": "zone open"
        })))
        .mount(&server)
        .await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::POST, "/vedo/areas/all/arm").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("zone open"));
}

#[tokio::test]
async fn bad_zone_segment_is_bad_request() {
    let server = mock_panel().await;
    let app = connected_app(&server).await;

    let (status, body) = call(&app, Method::POST, "/vedo/zones/all/isolate").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

// ── Panel failures ──────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_panel_maps_to_service_unavailable() {
    // Nothing listens on port 9 of localhost in the test environment.
    let vedo = Vedo::new(&config("http://127.0.0.1:9")).unwrap();
    let app = router(vedo);

    let (status, body) = call(&app, Method::GET, "/vedo/areas").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);

    let (status, body) = call(&app, Method::GET, "/vedo/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 5, "description": "Unknown" }));
}

#[tokio::test]
async fn panel_hanging_up_maps_to_service_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0_u8; 2048];
            let _ = socket.read(&mut buf).await;
        }
    });
    let app = router(Vedo::new(&config(&format!("http://{addr}"))).unwrap());

    let (status, body) = call(&app, Method::GET, "/vedo/areas").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn commands_before_connect_are_unavailable() {
    let server = mock_panel().await;
    let app = router(Vedo::new(&config(&server.uri())).unwrap());

    let (status, _) = call(&app, Method::POST, "/vedo/zones/0/include").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn slow_panel_maps_to_gateway_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login.cgi"))
        .respond_with(ok(json!({ "logged": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/area_desc.json"))
        .respond_with(ok(json!({ "logged": 1 })).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut cfg = config(&server.uri());
    cfg.exchange_timeout = Duration::from_millis(300);
    let app = router(Vedo::new(&cfg).unwrap());

    let (status, body) = call(&app, Method::GET, "/vedo/areas").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["status"], 504);
}
