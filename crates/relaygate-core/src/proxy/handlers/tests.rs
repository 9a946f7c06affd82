use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use base64::Engine;
use relaygate_types::models::{RetryConfig, SchedulerConfig, ServerConfig, UpstreamConfig};
use relaygate_types::Credential;
use serde_json::{json, Value};
use std::sync::Arc;

use super::gemini::parse_model_action;
use crate::modules::{LocalImageStore, MemoryCredentialStore, MemoryUsageLedger};
use crate::proxy::clock::ManualClock;
use crate::proxy::collaborators::ImageStore;
use crate::proxy::orchestrator::RequestOrchestrator;
use crate::proxy::scheduler::tests::{make_credential, FakeOAuth, T0};
use crate::proxy::scheduler::CredentialScheduler;
use crate::proxy::server::{build_proxy_router, AppState};
use crate::proxy::signature_cache::SignatureCache;
use crate::proxy::upstream::{AdapterContext, UpstreamClient};

fn state_with(
    credentials: Vec<Credential>,
    server: ServerConfig,
    images: Option<Arc<LocalImageStore>>,
) -> AppState {
    let scheduler = Arc::new(CredentialScheduler::new(
        SchedulerConfig::default(),
        Arc::new(MemoryCredentialStore::new(credentials.clone())),
        Arc::new(MemoryUsageLedger::new()),
        Arc::new(FakeOAuth::default()),
        Arc::new(ManualClock::new(T0)),
    ));
    scheduler.set_credentials(credentials);

    let upstream_config = UpstreamConfig {
        base_url: "http://127.0.0.1:9/v1internal".to_string(),
        ..Default::default()
    };
    let image_store: Arc<dyn ImageStore> = match &images {
        Some(store) => store.clone() as Arc<dyn ImageStore>,
        None => Arc::new(crate::proxy::upstream::stream::tests::FakeImageStore::default()),
    };

    AppState {
        orchestrator: Arc::new(RequestOrchestrator::new(scheduler, RetryConfig::default())),
        upstream: Arc::new(UpstreamClient::new(reqwest::Client::new(), &upstream_config)),
        adapter: AdapterContext::new(Arc::new(SignatureCache::new()), image_store),
        images,
        server_config: Arc::new(server),
    }
}

fn server(state: AppState) -> TestServer {
    TestServer::new(build_proxy_router(state)).unwrap()
}

#[test]
fn test_parse_model_action() {
    assert_eq!(
        parse_model_action("gemini-2.5-pro:generateContent").unwrap(),
        ("gemini-2.5-pro", false)
    );
    assert_eq!(
        parse_model_action("gemini-2.5-pro:streamGenerateContent").unwrap(),
        ("gemini-2.5-pro", true)
    );
    assert!(parse_model_action("gemini-2.5-pro").is_err());
    assert!(parse_model_action("gemini-2.5-pro:countTokens").is_err());
    assert!(parse_model_action(":generateContent").is_err());
}

#[tokio::test]
async fn test_list_models_endpoint_returns_json() {
    let server = server(state_with(vec![], ServerConfig::default(), None));

    let response = server.get("/v1/models").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["object"], "list");
    for model in json["data"].as_array().unwrap() {
        assert!(model["id"].is_string());
        assert_eq!(model["object"], "model");
        assert_eq!(model["owned_by"], "relaygate");
    }

    let native: Value = server.get("/v1beta/models").await.json();
    assert!(native["models"][0]["name"].as_str().unwrap().starts_with("models/"));
    server.get("/v1beta/models/gemini-2.5-pro").await.assert_status_ok();
    server.get("/v1beta/models/nope").await.assert_status_not_found();
}

#[tokio::test]
async fn test_health_reports_pool() {
    let mut disabled = make_credential("b");
    disabled.enabled = false;
    let credentials = vec![make_credential("a"), disabled];
    let server = server(state_with(credentials, ServerConfig::default(), None));

    let json: Value = server.get("/health").await.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["credentials"]["total"], 2);
    assert_eq!(json["credentials"]["enabled"], 1);
}

#[tokio::test]
async fn test_chat_completions_rejects_invalid_json() {
    let server = server(state_with(vec![], ServerConfig::default(), None));

    let response = server
        .post("/v1/chat/completions")
        .content_type("application/json")
        .bytes("not valid json".into())
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_chat_completions_rejects_missing_messages() {
    let server = server(state_with(vec![make_credential("a")], ServerConfig::default(), None));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({ "model": "gemini-2.5-pro", "messages": [] }))
        .await;
    response.assert_status_bad_request();
    let json: Value = response.json();
    assert_eq!(json["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_no_credentials_returns_503_per_dialect() {
    let server = server(state_with(vec![], ServerConfig::default(), None));

    let response = server
        .post("/v1/chat/completions")
        .json(&json!({ "model": "gemini-2.5-pro", "messages": [{"role": "user", "content": "hi"}] }))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json();
    assert_eq!(json["error"]["type"], "overloaded_error");

    let response = server
        .post("/v1/messages")
        .json(&json!({
            "model": "gemini-2.5-pro",
            "max_tokens": 64,
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json();
    assert_eq!(json["type"], "error");
    assert_eq!(json["error"]["type"], "overloaded_error");

    let response = server
        .post("/v1beta/models/gemini-2.5-pro:generateContent")
        .json(&json!({ "contents": [{"role": "user", "parts": [{"text": "hi"}]}] }))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json();
    assert_eq!(json["error"]["status"], "UNAVAILABLE");
}

#[tokio::test]
async fn test_gemini_unknown_method_rejected() {
    let server = server(state_with(vec![make_credential("a")], ServerConfig::default(), None));

    let response = server
        .post("/v1beta/models/gemini-2.5-pro:embedContent")
        .json(&json!({ "contents": [{"role": "user", "parts": [{"text": "hi"}]}] }))
        .await;
    response.assert_status_bad_request();
    let json: Value = response.json();
    assert_eq!(json["error"]["status"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_api_key_enforced_on_router() {
    let config = ServerConfig { api_key: "sk-test".to_string(), ..Default::default() };
    let server = server(state_with(vec![], config, None));

    server.get("/v1/models").await.assert_status(StatusCode::UNAUTHORIZED);
    server.get("/health").await.assert_status_ok();

    let response = server
        .get("/v1/models")
        .add_header(HeaderName::from_static("x-api-key"), HeaderValue::from_static("sk-test"))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_images_served_from_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalImageStore::new(dir.path().to_path_buf(), "http://localhost:8045"));
    let data = base64::engine::general_purpose::STANDARD.encode(b"png-bytes");
    let url = store.store(&data, "image/png").await.unwrap();
    let name = url.rsplit('/').next().unwrap().to_string();

    let server = server(state_with(vec![], ServerConfig::default(), Some(store)));

    let response = server.get(&format!("/images/{}", name)).await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/png");
    assert_eq!(response.as_bytes().as_ref(), b"png-bytes");

    server.get("/images/not-a-hash.png").await.assert_status_not_found();
    server.get("/images/abcdef.png").await.assert_status_not_found();
}
