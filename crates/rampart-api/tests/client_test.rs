#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rampart_api::{
    ApiClient, ClearSelection, ConfigMode, Direction, Error, LogAction, LogFilter,
    MemorySessionStore, ModeStatus, Notice, NoticeLevel, RequestOptions, RuleAction, RuleProtocol,
    RuleSpec, Session, SessionStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    notices: Mutex<Vec<Notice>>,
    redirects: AtomicUsize,
}

impl Recorder {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

struct Harness {
    server: MockServer,
    client: ApiClient,
    session: Arc<MemorySessionStore>,
    recorder: Arc<Recorder>,
}

async fn setup() -> Harness {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let session = Arc::new(MemorySessionStore::new());
    let recorder = Arc::new(Recorder::default());

    let on_notice = Arc::clone(&recorder);
    let on_redirect = Arc::clone(&recorder);
    let client = ApiClient::with_client(reqwest::Client::new(), base_url)
        .with_session_store(session.clone())
        .with_notifier(Arc::new(move |n: &Notice| {
            on_notice.notices.lock().unwrap().push(n.clone());
        }))
        .with_login_redirect(Arc::new(move || {
            on_redirect.redirects.fetch_add(1, Ordering::SeqCst);
        }));

    Harness {
        server,
        client,
        session,
        recorder,
    }
}

fn ssh_block() -> RuleSpec {
    RuleSpec {
        action: RuleAction::Deny,
        direction: Direction::In,
        protocol: RuleProtocol::Tcp,
        port: 22,
        host: "0.0.0.0".into(),
    }
}

fn log_entry(action: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "timestamp": "2025-03-01 10:00:00",
        "src_ip": "192.168.1.20",
        "dst_ip": "192.168.1.1",
        "src_port": 50412,
        "dst_port": 22,
        "protocol": 6,
        "length": 60,
        "action": action,
        "reason": "Matched rule 1"
    })
}

// ── Client core ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_clears_session_and_redirects_once() {
    let h = setup().await;
    h.session.set(Session::new("admin"));

    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "nope" })))
        .mount(&h.server)
        .await;

    let result = h.client.list_rules().await;

    assert!(
        matches!(result, Err(Error::Unauthenticated)),
        "expected Unauthenticated, got: {result:?}"
    );
    assert!(h.session.get().is_none());
    assert_eq!(h.recorder.redirects(), 1);

    let notices = h.recorder.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Session expired. Please log in again.");
}

#[tokio::test]
async fn test_unauthorized_from_every_binding_redirects() {
    let h = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let ip = "10.0.0.1";
    assert!(h.client.list_whitelist().await.unwrap_err().is_unauthenticated());
    assert!(h.client.add_whitelist(ip).await.unwrap_err().is_unauthenticated());
    assert!(h.client.get_mode(ConfigMode::Stealth).await.unwrap_err().is_unauthenticated());
    assert!(h.client.log_stats().await.unwrap_err().is_unauthenticated());
    assert!(h.client.delete_rule(3).await.unwrap_err().is_unauthenticated());

    assert_eq!(h.recorder.redirects(), 5);
    assert_eq!(h.recorder.notices().len(), 5);
}

#[tokio::test]
async fn test_error_message_from_server_body() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/whitelist/manage"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "IP already whitelisted" })),
        )
        .mount(&h.server)
        .await;

    let err = h
        .client
        .add_whitelist("10.0.0.1")
        .await
        .unwrap_err();

    match &err {
        Error::Request { status, message } => {
            assert_eq!(*status, 409);
            assert_eq!(message, "IP already whitelisted");
        }
        other => panic!("expected Request error, got: {other:?}"),
    }
    assert_eq!(h.recorder.redirects(), 0);
    assert_eq!(h.recorder.notices(), vec![Notice::error("IP already whitelisted")]);
}

#[tokio::test]
async fn test_error_message_synthesized_for_non_json_body() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/logs/stats"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&h.server)
        .await;

    let err = h.client.log_stats().await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.message(), "HTTP error 502: Bad Gateway");
    assert_eq!(h.recorder.notices().len(), 1);
}

#[tokio::test]
async fn test_malformed_success_body() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rules/next_rule_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "seven" })))
        .mount(&h.server)
        .await;

    let result = h.client.next_rule_id().await;
    assert!(
        matches!(result, Err(Error::MalformedResponse { .. })),
        "expected MalformedResponse, got: {result:?}"
    );
    assert_eq!(h.recorder.notices().len(), 1);
}

#[tokio::test]
async fn test_inconsistent_chart_data_is_malformed() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/logs/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stats": { "allowed": 5, "blocked": 1, "blocked_details": [] },
            "chart_data": {
                "labels": ["Allowed", "Blocked"],
                "datasets": [{ "label": "Packets", "data": [5, 1], "backgroundColor": ["#22c55e"] }]
            }
        })))
        .mount(&h.server)
        .await;

    let err = h.client.log_stats().await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_transport_failure_notifies() {
    let recorder = Arc::new(Recorder::default());
    let sink = Arc::clone(&recorder);
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:1/api").unwrap(),
    )
    .with_notifier(Arc::new(move |n: &Notice| {
        sink.notices.lock().unwrap().push(n.clone());
    }));

    let err = client.list_rules().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));

    let notices = recorder.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.starts_with("Failed to connect to server"));
}

#[tokio::test]
async fn test_caller_headers_override_defaults() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .and(header("accept", "application/vnd.rampart+json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rules": [] })))
        .expect(1)
        .mount(&h.server)
        .await;

    let options = RequestOptions::new().header(
        ACCEPT,
        HeaderValue::from_static("application/vnd.rampart+json"),
    );
    let body: serde_json::Value = h
        .client
        .request(Method::GET, "/rules", options)
        .await
        .unwrap();
    assert_eq!(body, json!({ "rules": [] }));
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "admin", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "username": "admin" }
        })))
        .mount(&h.server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    let session = h.client.login("admin", &secret).await.unwrap();
    assert_eq!(session, Session::new("admin"));
    assert!(h.recorder.notices().is_empty());
}

#[tokio::test]
async fn test_login_without_identity_is_not_notified_by_core() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "Invalid credentials"
        })))
        .mount(&h.server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = h.client.login("admin", &secret).await;

    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(h.recorder.notices().is_empty());
}

// ── Rules ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_rules() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rules": [{
                "rule_id": 1,
                "action": "deny",
                "direction": "in",
                "protocol": "tcp",
                "port": 22,
                "host": "0.0.0.0",
                "created_at": "2025-03-01 09:00:00"
            }, {
                "rule_id": 2,
                "action": "allow",
                "direction": "out",
                "protocol": "all",
                "port": 0,
                "host": "10.0.0.0"
            }]
        })))
        .mount(&h.server)
        .await;

    let rules = h.client.list_rules().await.unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].rule_id, Some(1));
    assert_eq!(rules[0].spec(), ssh_block());
    assert_eq!(rules[1].protocol, RuleProtocol::All);
    assert!(rules[1].created_at.is_none());
}

#[tokio::test]
async fn test_create_rule_body() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/rules/next_rule_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rule_id": 7 })))
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/manage"))
        .and(body_json(json!({
            "rule": {
                "operation": "add",
                "rule_id": 7,
                "action": "deny",
                "direction": "in",
                "protocol": "tcp",
                "port": 22,
                "host": "0.0.0.0"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Rule added"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let id = h.client.next_rule_id().await.unwrap();
    let msg = h.client.create_rule(id, &ssh_block()).await.unwrap();
    assert!(msg.is_success());
    assert_eq!(msg.message, "Rule added");
}

#[tokio::test]
async fn test_update_rule_body() {
    let h = setup().await;
    let mut spec = ssh_block();
    spec.port = 2222;

    Mock::given(method("POST"))
        .and(path("/api/manage"))
        .and(body_json(json!({
            "rule": {
                "operation": "update",
                "rule_id": 3,
                "action": "deny",
                "direction": "in",
                "protocol": "tcp",
                "port": 2222,
                "host": "0.0.0.0"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let msg = h.client.update_rule(3, &spec).await.unwrap();
    assert_eq!(msg.message_or("Rule updated"), "Rule updated");
}

#[tokio::test]
async fn test_delete_rule_path() {
    let h = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/delete/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Rule 12 deleted"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let msg = h.client.delete_rule(12).await.unwrap();
    assert_eq!(msg.message, "Rule 12 deleted");
}

// ── Whitelist ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_whitelist() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/whitelist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "ok",
            "whitelist": [{ "ip_address": "192.168.1.50", "created_at": "2025-03-01" }]
        })))
        .mount(&h.server)
        .await;

    let entries = h.client.list_whitelist().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].ip_address, "192.168.1.50");
}

#[tokio::test]
async fn test_list_whitelist_missing_array_is_empty() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/whitelist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "No entries"
        })))
        .mount(&h.server)
        .await;

    assert!(h.client.list_whitelist().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_whitelist_add_and_remove_bodies() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/whitelist/manage"))
        .and(body_json(json!({ "operation": "add", "ip_address": "10.1.2.3" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/whitelist/manage"))
        .and(body_json(json!({ "operation": "remove", "ip_address": "10.1.2.3" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "IP removed"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let ip = "10.1.2.3";
    h.client.add_whitelist(ip).await.unwrap();
    let removed = h.client.remove_whitelist(ip).await.unwrap();
    assert_eq!(removed.message, "IP removed");
}

// ── Modes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_mode() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/config/lockdown"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "status": "on" }
        })))
        .mount(&h.server)
        .await;

    let status = h.client.get_mode(ConfigMode::Lockdown).await.unwrap();
    assert_eq!(status, ModeStatus::On);
}

#[tokio::test]
async fn test_set_mode_goes_through_manage() {
    let h = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/manage"))
        .and(body_json(json!({ "config": { "stealth": "off" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Stealth mode disabled"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let msg = h
        .client
        .set_mode(ConfigMode::Stealth, ModeStatus::Off)
        .await
        .unwrap();
    assert_eq!(msg.message, "Stealth mode disabled");
}

// ── Logs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_realtime_logs_query() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/logs/realtime"))
        .and(query_param("limit", "25"))
        .and(query_param("srv", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [log_entry("ALLOW")],
            "count": 1,
            "server_logs_included": true,
            "total_logs_available": 40
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let logs = h.client.realtime_logs(25, true).await.unwrap();
    assert_eq!(logs.count, 1);
    assert!(logs.server_logs_included);
    assert_eq!(logs.logs[0].protocol_name(), "TCP");
    assert_eq!(logs.logs[0].action, LogAction::Allow);
}

#[tokio::test]
async fn test_blocked_logs() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/logs/blocked"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [log_entry("DENY")],
            "total": 1,
            "limit": 10
        })))
        .mount(&h.server)
        .await;

    let blocked = h.client.blocked_logs(10).await.unwrap();
    assert_eq!(blocked.total, 1);
    assert_eq!(blocked.logs[0].action, LogAction::Deny);
}

#[tokio::test]
async fn test_all_logs_sends_only_set_filters() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/logs/all"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "200"))
        .and(query_param("action", "DENY"))
        .and(query_param("src_ip", "10.0.0.9"))
        .and(query_param_is_missing("dst_ip"))
        .and(query_param_is_missing("protocol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logs": [],
            "total": 0,
            "limit": 100,
            "offset": 200,
            "filters": { "action": "DENY" }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let filter = LogFilter {
        limit: Some(100),
        offset: Some(200),
        action: Some(LogAction::Deny),
        src_ip: Some("10.0.0.9".into()),
        ..LogFilter::default()
    };
    let page = h.client.all_logs(&filter).await.unwrap();
    assert_eq!(page.offset, 200);
    assert!(page.logs.is_empty());
}

#[tokio::test]
async fn test_log_stats() {
    let h = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/logs/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stats": {
                "allowed": 120,
                "blocked": 30,
                "blocked_details": [{ "reason": "Rule 1", "count": 30 }]
            },
            "chart_data": {
                "labels": ["Allowed", "Blocked"],
                "datasets": [{
                    "label": "Traffic",
                    "data": [120, 30],
                    "backgroundColor": ["#22c55e", "#ef4444"]
                }]
            }
        })))
        .mount(&h.server)
        .await;

    let stats = h.client.log_stats().await.unwrap();
    assert_eq!(stats.stats.total(), 150);
    assert_eq!(stats.stats.blocked_details[0].reason, "Rule 1");
    assert_eq!(stats.chart_data.labels.len(), 2);
}

#[tokio::test]
async fn test_clear_logs_sends_selected_flags() {
    let h = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/logs/clear"))
        .and(query_param("clear_realtime", "true"))
        .and(query_param_is_missing("clear_blocked"))
        .and(query_param_is_missing("clear_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": { "realtime": 42 },
            "message": "Logs cleared"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let resp = h
        .client
        .clear_logs(ClearSelection {
            realtime: true,
            ..ClearSelection::default()
        })
        .await
        .unwrap();
    assert_eq!(resp.message, "Logs cleared");
    assert_eq!(resp.results["realtime"], 42);
}
