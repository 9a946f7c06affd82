//! Shared fixtures: a gateway wired to in-memory collaborators and a
//! wiremock upstream.
#![allow(dead_code)]

use axum_test::TestServer;
use relaygate_core::modules::{GoogleOAuthClient, MemoryCredentialStore, MemoryUsageLedger};
use relaygate_core::proxy::upstream::{AdapterContext, UpstreamClient};
use relaygate_core::proxy::{
    build_proxy_router, AppState, CredentialScheduler, ImageStore, RequestOrchestrator,
    SignatureCache, SystemClock,
};
use relaygate_types::models::{
    RetryConfig, RuntimeStats, SchedulerConfig, ServerConfig, UpstreamConfig,
};
use relaygate_types::{CollaboratorError, Credential};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub struct NullImageStore;

#[async_trait::async_trait]
impl ImageStore for NullImageStore {
    async fn store(&self, _data: &str, _mime: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Io { message: "image storage disabled".to_string() })
    }
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Credential with a live access token `tok-{id}` and project `project-{id}`.
pub fn credential(id: &str) -> Credential {
    let mut cred = Credential::new(
        format!("refresh-{id}"),
        format!("tok-{id}"),
        now_secs() + 3600,
        Some(format!("project-{id}")),
    );
    cred.id = id.to_string();
    cred
}

pub struct Gateway {
    pub server: TestServer,
    pub state: AppState,
    pub upstream: MockServer,
    pub store: Arc<MemoryCredentialStore>,
}

impl Gateway {
    pub fn scheduler(&self) -> &Arc<CredentialScheduler> {
        self.state.orchestrator.scheduler()
    }

    /// Make `id` look recently used so it sorts last in LRU order.
    pub fn mark_recently_used(&self, id: &str) {
        let stats = RuntimeStats {
            last_used: chrono::Utc::now().timestamp_millis() - 1_000,
            ..Default::default()
        };
        self.scheduler().set_runtime_stats(id, stats);
    }

    /// Bodies of every request the upstream received, in order.
    pub async fn upstream_bodies(&self) -> Vec<Value> {
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig { base_backoff_ms: 10, max_backoff_ms: 50, jitter_ratio: 0.0, ..Default::default() }
}

pub async fn gateway(credentials: Vec<Credential>, retry: RetryConfig) -> Gateway {
    gateway_with(credentials, SchedulerConfig { pool_size: 1, ..Default::default() }, retry).await
}

pub async fn gateway_with(
    credentials: Vec<Credential>,
    scheduler_config: SchedulerConfig,
    retry: RetryConfig,
) -> Gateway {
    let upstream = MockServer::start().await;
    let upstream_config = UpstreamConfig {
        base_url: format!("{}/v1internal", upstream.uri()),
        oauth_token_url: format!("{}/token", upstream.uri()),
        client_id: "client".to_string(),
        ..Default::default()
    };
    let http = reqwest::Client::new();

    let store = Arc::new(MemoryCredentialStore::new(credentials.clone()));
    let scheduler = Arc::new(CredentialScheduler::new(
        scheduler_config,
        store.clone(),
        Arc::new(MemoryUsageLedger::new()),
        Arc::new(GoogleOAuthClient::new(http.clone(), &upstream_config)),
        Arc::new(SystemClock),
    ));
    scheduler.set_credentials(credentials);

    let state = AppState {
        orchestrator: Arc::new(RequestOrchestrator::new(scheduler, retry)),
        upstream: Arc::new(UpstreamClient::new(http, &upstream_config)),
        adapter: AdapterContext::new(Arc::new(SignatureCache::new()), Arc::new(NullImageStore)),
        images: None,
        server_config: Arc::new(ServerConfig { heartbeat_interval_secs: 30, ..Default::default() }),
    };

    let server = TestServer::new(build_proxy_router(state.clone())).unwrap_or_else(|e| {
        panic!("test server failed to start: {}", e);
    });
    Gateway { server, state, upstream, store }
}

/// SSE body made of `data:` frames.
pub fn sse(frames: &[Value]) -> String {
    frames.iter().map(|f| format!("data: {}\n\n", f)).collect()
}

pub fn text_frame(text: &str) -> Value {
    json!({ "response": { "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] } })
}

pub fn parts_frame(parts: Value, finish: Option<&str>) -> Value {
    let mut candidate = json!({ "content": { "role": "model", "parts": parts } });
    if let Some(reason) = finish {
        candidate["finishReason"] = json!(reason);
    }
    json!({
        "response": {
            "candidates": [candidate],
            "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6 }
        }
    })
}

pub fn finish_frame() -> Value {
    parts_frame(json!([]), Some("STOP"))
}

/// Unary response document.
pub fn unary(parts: Value) -> Value {
    parts_frame(parts, Some("STOP"))
}

/// Split an SSE body into `data:` payloads, ignoring comments and event lines.
pub fn data_lines(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|l| l.strip_prefix("data: "))
        .map(str::to_string)
        .collect()
}
