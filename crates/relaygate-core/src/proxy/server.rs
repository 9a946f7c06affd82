use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use relaygate_types::models::ServerConfig;
use relaygate_types::AppConfig;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::modules::config::get_data_dir;
use crate::modules::{GoogleOAuthClient, JsonCredentialStore, JsonUsageLedger, LocalImageStore};
use crate::proxy::clock::SystemClock;
use crate::proxy::handlers;
use crate::proxy::middleware::{auth_middleware, cors_layer};
use crate::proxy::orchestrator::RequestOrchestrator;
use crate::proxy::scheduler::CredentialScheduler;
use crate::proxy::signature_cache::SignatureCache;
use crate::proxy::upstream::{AdapterContext, UpstreamClient};

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
    pub upstream: Arc<UpstreamClient>,
    pub adapter: AdapterContext,
    /// Present when images are stored locally and served by `/images/:name`.
    pub images: Option<Arc<LocalImageStore>>,
    pub server_config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the file-backed collaborators described by `config` and load
    /// the credential pool, replaying ledger stats into the scheduler.
    pub async fn from_config(config: &AppConfig) -> Result<Self, String> {
        let data_dir = get_data_dir(config)?;
        let http = UpstreamClient::build_http_client(&config.upstream)?;

        let scheduler = load_scheduler(config, &data_dir, http.clone()).await?;
        if scheduler.credentials().iter().all(|c| !c.enabled) {
            tracing::warn!("No enabled credentials; requests fail until credentials are added");
        }

        let public_base_url = config
            .storage
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", config.server.get_socket_addr()));
        let images = Arc::new(LocalImageStore::new(
            data_dir.join(&config.storage.images_dir),
            public_base_url,
        ));

        Ok(Self {
            orchestrator: Arc::new(RequestOrchestrator::new(scheduler, config.retry.clone())),
            upstream: Arc::new(UpstreamClient::new(http, &config.upstream)),
            adapter: AdapterContext::new(Arc::new(SignatureCache::new()), images.clone()),
            images: Some(images),
            server_config: Arc::new(config.server.clone()),
        })
    }
}

/// Build a scheduler over the file-backed store and ledger under
/// `data_dir`, with credentials loaded and ledger stats replayed.
pub async fn load_scheduler(
    config: &AppConfig,
    data_dir: &Path,
    http: reqwest::Client,
) -> Result<Arc<CredentialScheduler>, String> {
    let store = Arc::new(JsonCredentialStore::new(data_dir.join(&config.storage.credentials_file)));
    let ledger = Arc::new(JsonUsageLedger::new(data_dir.join(&config.storage.ledger_file)));
    let oauth = Arc::new(GoogleOAuthClient::new(http, &config.upstream));
    let scheduler = Arc::new(CredentialScheduler::new(
        config.scheduler.clone(),
        store,
        ledger,
        oauth,
        Arc::new(SystemClock),
    ));

    scheduler.load().await.map_err(|e| format!("Failed to load credentials: {}", e))?;
    Ok(scheduler)
}

/// Build the downstream router for all three dialects.
pub fn build_proxy_router(state: AppState) -> Router {
    let body_limit = state.server_config.body_limit_mb.saturating_mul(1024 * 1024);

    Router::new()
        // OpenAI Protocol
        .route("/v1/models", get(handlers::models::handle_list_models))
        .route("/v1/chat/completions", post(handlers::openai::handle_chat_completions))
        // Claude Protocol
        .route("/v1/messages", post(handlers::claude::handle_messages))
        // Gemini Protocol
        .route("/v1beta/models", get(handlers::gemini::handle_list_models))
        .route(
            "/v1beta/models/:model",
            get(handlers::gemini::handle_get_model).post(handlers::gemini::handle_generate),
        )
        // Utility
        .route("/images/:name", get(handlers::images::handle_get_image))
        .route("/health", get(handlers::health::handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.server_config.clone(),
            auth_middleware,
        ))
        .layer(cors_layer())
        .with_state(state)
}

/// Axum server instance
pub struct AxumServer {
    state: AppState,
}

impl AxumServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves; in-flight requests are drained.
    pub async fn run_until<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.server_config.get_socket_addr();
        let auth = if self.state.server_config.auth_enabled() { "enabled" } else { "disabled" };
        let app = build_proxy_router(self.state);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Starting Axum server on {} (api key auth {})", addr, auth);
        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}
