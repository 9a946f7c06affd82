mod request_executor;

#[cfg(test)]
mod tests;

pub use request_executor::{build_headers, build_url};

use futures::StreamExt;
use relaygate_types::models::UpstreamConfig;
use relaygate_types::protocol::gemini::{GenerateRequest, UpstreamEnvelope};
use relaygate_types::{Credential, NormalizedEvent, ProxyError};
use reqwest::Client;
use serde_json::Value;

use super::stream::{
    collect_events, decode_frames, embedded_failure, normalize_stream, unwrap_response,
    AdapterContext, EventStream,
};
use crate::proxy::orchestrator::UpstreamFailure;

const STREAM_METHOD: &str = "streamGenerateContent";
const UNARY_METHOD: &str = "generateContent";

/// Issues generation calls against the v1internal endpoint for one
/// selected credential.
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    user_agent: String,
}

impl UpstreamClient {
    /// Accepts a pre-built `reqwest::Client` so TLS setup happens once at
    /// startup rather than inside the runtime.
    pub fn new(http_client: Client, config: &UpstreamConfig) -> Self {
        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Build the shared HTTP client from upstream settings.
    pub fn build_http_client(config: &UpstreamConfig) -> Result<Client, String> {
        Client::builder()
            .connect_timeout(request_executor::connect_timeout(config.connect_timeout_secs))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn envelope(
        credential: &Credential,
        model: &str,
        source: &str,
        mut request: GenerateRequest,
    ) -> UpstreamEnvelope {
        if request.session_id.is_none() {
            request.session_id = Some(credential.session_id.clone());
        }
        let project = credential.project_id.as_deref().unwrap_or_default();
        UpstreamEnvelope::new(project, model, source, request)
    }

    async fn post(
        &self,
        credential: &Credential,
        method: &str,
        query_string: Option<&str>,
        envelope: &UpstreamEnvelope,
    ) -> Result<reqwest::Response, UpstreamFailure> {
        let url = build_url(&self.base_url, method, query_string);
        let headers = build_headers(&credential.access_token, &self.user_agent)
            .map_err(UpstreamFailure::transport)?;

        tracing::debug!(
            "[Upstream] {} credential={} model={} request_id={}",
            method,
            credential.label(),
            envelope.model,
            envelope.request_id
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(envelope)
            .send()
            .await
            .map_err(|e| request_executor::transport_failure(&e))?;

        if !response.status().is_success() {
            return Err(request_executor::failure_from_response(response).await);
        }
        Ok(response)
    }

    /// Streaming call. The first frame is inspected before the stream is
    /// handed back so an auth failure embedded in a 200 is still reported
    /// as a dispatch failure.
    pub async fn stream_generate(
        &self,
        credential: &Credential,
        model: &str,
        source: &str,
        request: GenerateRequest,
        ctx: AdapterContext,
    ) -> Result<EventStream, UpstreamFailure> {
        let envelope = Self::envelope(credential, model, source, request);
        let response = self.post(credential, STREAM_METHOD, Some("alt=sse"), &envelope).await?;

        let mut frames = decode_frames(response.bytes_stream());
        let first = match frames.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(UpstreamFailure::transport(e.to_string())),
            None => {
                return Err(UpstreamFailure::new(
                    502,
                    "Empty response stream from upstream".to_string(),
                    None,
                ))
            },
        };
        if let Some(failure) = embedded_failure(&first) {
            return Err(failure);
        }

        let frames = futures::stream::once(async move { Ok::<_, ProxyError>(first) }).chain(frames);
        Ok(normalize_stream(Box::pin(frames), ctx))
    }

    /// Non-streaming call returning the unwrapped response document.
    pub async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        source: &str,
        request: GenerateRequest,
    ) -> Result<Value, UpstreamFailure> {
        let envelope = Self::envelope(credential, model, source, request);
        let response = self.post(credential, UNARY_METHOD, None, &envelope).await?;

        let body: Value = response.json().await.map_err(|e| {
            UpstreamFailure::new(502, format!("Invalid upstream JSON: {}", e), None)
        })?;
        if let Some(failure) = embedded_failure(&body) {
            return Err(failure);
        }
        Ok(unwrap_response(body))
    }

    /// Non-streaming call classified into normalized events.
    pub async fn generate_events(
        &self,
        credential: &Credential,
        model: &str,
        source: &str,
        request: GenerateRequest,
        ctx: AdapterContext,
    ) -> Result<Vec<NormalizedEvent>, UpstreamFailure> {
        let document = self.generate(credential, model, source, request).await?;
        Ok(collect_events(&document, &ctx).await)
    }
}
