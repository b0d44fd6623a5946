// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lifecycle and dispatch tests driving [`Server`] the way the stdio loop
//! does: JSON-RPC request strings in, response strings out.

use dgw_core::config::{
    BackendConfig, GatewayConfig, MonitoringConfig, NlpConfig, ProtocolConfig, RateLimitConfig,
    SecurityConfig, UserCredential,
};
use dgw_core::Role;
use dgw_server::Server;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPERATOR_KEY: &str = "operator-key-at-least-24-bytes";
const ADMIN_KEY: &str = "admin-key-at-least-24-bytes-too";
const READONLY_KEY: &str = "readonly-key-at-least-24-bytes1";

async fn config_against(backend_base_url: String) -> GatewayConfig {
    GatewayConfig {
        backend: BackendConfig {
            base_url: backend_base_url,
            timeout_s: 5,
            max_retries: 1,
            api_key: "backend-key".into(),
        },
        security: SecurityConfig {
            jwt_secret: "x".repeat(32),
            users: vec![
                UserCredential { id: "op1".into(), role: Role::Operator, credential: OPERATOR_KEY.into() },
                UserCredential { id: "admin1".into(), role: Role::Admin, credential: ADMIN_KEY.into() },
                UserCredential { id: "ro1".into(), role: Role::Readonly, credential: READONLY_KEY.into() },
            ],
            rate_limits: RateLimitConfig { requests_per_minute: 600, burst: 50 },
            max_failed_attempts: 3,
            lockout_duration_minutes: 15,
            allowed_ips: vec![],
            blocked_ips: vec![],
            lockout_scope: Default::default(),
        },
        nlp: NlpConfig::default(),
        monitoring: MonitoringConfig { enabled: false, ..MonitoringConfig::default() },
        protocol: ProtocolConfig { frame_max_bytes: 4096, idle_timeout_s: 300, worker_pool_size: 4 },
    }
}

async fn backend_mock() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drones/A1/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/drones/A1/takeoff"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/drones/A1/land"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;
    server
}

async fn rpc(server: &Server, id: i64, method: &str, params: Value) -> Value {
    let request = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string();
    let response = server.handle_line(&request).await.expect("expected a response");
    serde_json::from_str(&response).unwrap()
}

#[tokio::test]
async fn initialize_then_tools_list_then_call() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    let init = rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    assert_eq!(init["result"]["server_state"], "serving");

    let tools = rpc(&server, 2, "tools/list", json!({})).await;
    let names: Vec<&str> = tools["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"connect_drone"));
    assert!(names.contains(&"takeoff"));

    let call = rpc(
        &server,
        3,
        "tools/call",
        json!({"name": "connect_drone", "arguments": {"drone_id": "A1"}}),
    )
    .await;
    assert_eq!(call["result"]["status"], "success");
}

#[tokio::test]
async fn calling_tools_before_initialize_is_rejected() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    let call = rpc(&server, 1, "tools/list", json!({})).await;
    assert_eq!(call["error"]["code"], -32002);
}

#[tokio::test]
async fn unknown_credential_is_unauthorized() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    let init = rpc(&server, 1, "initialize", json!({"credential": "totally-unknown-credential-1"})).await;
    assert_eq!(init["error"]["code"], -32001);
}

#[tokio::test]
async fn readonly_principal_cannot_call_operator_tools() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": READONLY_KEY})).await;
    let call = rpc(
        &server,
        2,
        "tools/call",
        json!({"name": "takeoff", "arguments": {"drone_id": "A1"}}),
    )
    .await;
    assert_eq!(call["error"]["code"], -32003);
}

#[tokio::test]
async fn readonly_principal_can_read_drones_list() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": READONLY_KEY})).await;
    let read = rpc(&server, 2, "resources/read", json!({"uri": "drones://list"})).await;
    assert!(read["result"]["drones"].is_array());
}

#[tokio::test]
async fn takeoff_without_connect_fails_precondition() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    let call = rpc(
        &server,
        2,
        "tools/call",
        json!({"name": "takeoff", "arguments": {"drone_id": "A1"}}),
    )
    .await;
    let status = &call["result"]["status"];
    assert!(status == "failed" || status == "partial", "unexpected status: {status:?}");
}

#[tokio::test]
async fn double_initialize_is_rejected() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    let second = rpc(&server, 2, "initialize", json!({"credential": OPERATOR_KEY})).await;
    assert!(second["error"].is_object());
}

#[tokio::test]
async fn shutdown_requires_admin_role() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    let shutdown = rpc(&server, 2, "shutdown", json!({})).await;
    assert_eq!(shutdown["error"]["code"], -32003);
    assert!(!server.is_closed());
}

#[tokio::test]
async fn admin_shutdown_closes_the_server() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": ADMIN_KEY})).await;
    let shutdown = rpc(&server, 2, "shutdown", json!({})).await;
    assert_eq!(shutdown["result"]["server_state"], "closed");
    assert!(server.is_closed());

    let after = rpc(&server, 3, "tools/list", json!({})).await;
    assert_eq!(after["error"]["code"], -32004);
}

#[tokio::test]
async fn notification_without_id_produces_no_response() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    let request = json!({"jsonrpc": "2.0", "method": "tools/list", "params": {}}).to_string();
    assert!(server.handle_line(&request).await.is_none());
}

#[tokio::test]
async fn malformed_json_yields_parse_error() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    let response = server.handle_line("not json at all").await.unwrap();
    let value: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["error"]["code"], -32700);
}

#[tokio::test]
async fn full_connect_takeoff_land_batch_succeeds() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    rpc(&server, 2, "tools/call", json!({"name": "connect_drone", "arguments": {"drone_id": "A1"}})).await;
    rpc(&server, 3, "tools/call", json!({"name": "takeoff", "arguments": {"drone_id": "A1"}})).await;
    let land = rpc(&server, 4, "tools/call", json!({"name": "land", "arguments": {"drone_id": "A1"}})).await;
    assert_eq!(land["result"]["status"], "success");

    let drones = rpc(&server, 5, "resources/read", json!({"uri": "drones://list"})).await;
    let listed = drones["result"]["drones"].as_array().unwrap();
    let a1 = listed.iter().find(|d| d["drone_id"] == "A1").unwrap();
    assert_eq!(a1["connected"], true);
    assert_eq!(a1["flying"], false);
}

#[tokio::test]
async fn unknown_tool_name_is_method_not_found() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    let call = rpc(&server, 2, "tools/call", json!({"name": "nonexistent_tool", "arguments": {}})).await;
    assert_eq!(call["error"]["code"], -32601);
}

#[tokio::test]
async fn per_request_auth_field_overrides_session_principal() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    // Session was initialized as readonly, but this call carries an admin
    // credential in `_auth`, which must be authenticated fresh and used in
    // place of the session principal for this one request.
    rpc(&server, 1, "initialize", json!({"credential": READONLY_KEY})).await;
    let call = rpc(
        &server,
        2,
        "tools/call",
        json!({"name": "takeoff", "arguments": {"drone_id": "A1"}, "_auth": OPERATOR_KEY}),
    )
    .await;
    assert_ne!(call["error"]["code"], -32003);
}

#[tokio::test]
async fn per_request_auth_field_with_unknown_credential_is_unauthorized() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    let call = rpc(
        &server,
        2,
        "tools/call",
        json!({"name": "takeoff", "arguments": {"drone_id": "A1"}, "_auth": "totally-unknown-credential-1"}),
    )
    .await;
    assert_eq!(call["error"]["code"], -32001);
}

#[tokio::test]
async fn direct_tool_call_with_out_of_range_distance_is_invalid_params() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    let call = rpc(
        &server,
        2,
        "tools/call",
        json!({"name": "move", "arguments": {"drone_id": "A1", "direction": "right", "distance_cm": 9999}}),
    )
    .await;
    assert_eq!(call["error"]["code"], -32602);
}

#[tokio::test]
async fn system_health_resource_reports_alerts_and_threat_summary() {
    let backend = backend_mock().await;
    let config = config_against(backend.uri()).await;
    let server = Server::new(config).unwrap();

    rpc(&server, 1, "initialize", json!({"credential": OPERATOR_KEY})).await;
    let health = rpc(&server, 2, "resources/read", json!({"uri": "system://health"})).await;
    assert!(health["result"]["alerts"].is_array());
    assert!(health["result"]["threat_summary"].is_object());
}
