//! Shared plumbing for the dialect handlers: orchestrated dispatch, SSE
//! framing with heartbeats, and per-dialect error envelopes.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use relaygate_types::{Credential, NormalizedEvent, ProxyError};
use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use crate::proxy::mappers::gemini::error_document;
use crate::proxy::mappers::{InternalRequest, SseStream};
use crate::proxy::orchestrator::{AttemptRecord, Dispatched};
use crate::proxy::server::AppState;
use crate::proxy::upstream::EventStream;

const CREDENTIAL_HEADER: &str = "x-relaygate-credential";
const ATTEMPTS_HEADER: &str = "x-relaygate-attempts";

/// Downstream wire dialect of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    OpenAI,
    Claude,
    Gemini,
}

impl Dialect {
    /// Tag forwarded upstream as the request id prefix.
    pub fn source(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }

    pub fn heartbeat(self) -> &'static [u8] {
        match self {
            Self::Claude => b"event: ping\ndata: {\"type\":\"ping\"}\n\n",
            Self::OpenAI | Self::Gemini => b": keep-alive\n\n",
        }
    }
}

pub fn error_body(dialect: Dialect, err: &ProxyError) -> Value {
    let status = err.http_status_code();
    let message = err.to_string();
    match dialect {
        Dialect::OpenAI => json!({
            "error": {
                "message": message,
                "type": err.kind(),
                "code": status
            }
        }),
        Dialect::Claude => json!({
            "type": "error",
            "error": {
                "type": err.kind(),
                "message": message
            }
        }),
        Dialect::Gemini => error_document(err),
    }
}

/// Render a request-level failure in the dialect's error envelope.
pub fn error_response(dialect: Dialect, err: &ProxyError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!("[{:?}] Request failed: {}", dialect, err);
    } else {
        tracing::warn!("[{:?}] Request failed: {}", dialect, err);
    }

    let mut response = (status, Json(error_body(dialect, err))).into_response();
    if let Some(secs) = err.retry_after_secs() {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

enum Tick {
    Data(Option<Bytes>),
    Heartbeat,
}

/// Interleave heartbeat frames into an encoded SSE stream. The timer is
/// reset by every data frame so heartbeats only fill idle gaps.
pub fn with_heartbeat(
    mut stream: SseStream,
    dialect: Dialect,
    period: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
    async_stream::stream! {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let tick = tokio::select! {
                item = stream.next() => Tick::Data(item),
                _ = ticker.tick() => Tick::Heartbeat,
            };
            match tick {
                Tick::Data(Some(bytes)) => {
                    ticker.reset();
                    yield Ok(bytes);
                },
                Tick::Data(None) => break,
                Tick::Heartbeat => yield Ok(Bytes::from_static(dialect.heartbeat())),
            }
        }
    }
}

/// Stamp the serving credential and attempt count on a successful response.
fn annotate(mut response: Response, credential: &Credential, record: &AttemptRecord) -> Response {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&credential.id) {
        headers.insert(CREDENTIAL_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&record.attempt_number.to_string()) {
        headers.insert(ATTEMPTS_HEADER, value);
    }
    response
}

pub fn sse_response(
    state: &AppState,
    dialect: Dialect,
    credential: &Credential,
    record: &AttemptRecord,
    encoded: SseStream,
) -> Response {
    let period = Duration::from_secs(state.server_config.heartbeat_interval_secs.max(1));
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(with_heartbeat(encoded, dialect, period)))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build SSE response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal streaming setup error").into_response()
        });
    annotate(response, credential, record)
}

pub fn json_response<B: Serialize>(
    credential: &Credential,
    record: &AttemptRecord,
    body: &B,
) -> Response {
    annotate((StatusCode::OK, Json(body)).into_response(), credential, record)
}

fn timeout_error(secs: u64) -> ProxyError {
    ProxyError::Upstream {
        status: 504,
        message: format!("Upstream did not respond within {}s", secs),
        retry_after_secs: None,
    }
}

/// Run a streaming request through the orchestrator. The timeout covers
/// dispatch up to the first upstream frame.
pub async fn dispatch_stream(
    state: &AppState,
    dialect: Dialect,
    internal: InternalRequest,
) -> Result<Dispatched<EventStream>, ProxyError> {
    let InternalRequest { model, request, .. } = internal;
    let upstream = state.upstream.clone();
    let ctx = state.adapter.clone();
    let secs = state.server_config.request_timeout_secs;

    let run = state.orchestrator.execute(|credential| {
        let upstream = upstream.clone();
        let ctx = ctx.clone();
        let request = request.clone();
        let model = model.clone();
        async move {
            upstream.stream_generate(&credential, &model, dialect.source(), request, ctx).await
        }
    });

    tokio::time::timeout(Duration::from_secs(secs), run).await.map_err(|_| timeout_error(secs))?
}

/// Run a non-streaming request through the orchestrator and collect the
/// classified events.
pub async fn dispatch_unary(
    state: &AppState,
    dialect: Dialect,
    internal: InternalRequest,
) -> Result<Dispatched<Vec<NormalizedEvent>>, ProxyError> {
    let InternalRequest { model, request, .. } = internal;
    let upstream = state.upstream.clone();
    let ctx = state.adapter.clone();
    let secs = state.server_config.request_timeout_secs;

    let run = state.orchestrator.execute(|credential| {
        let upstream = upstream.clone();
        let ctx = ctx.clone();
        let request = request.clone();
        let model = model.clone();
        async move {
            upstream.generate_events(&credential, &model, dialect.source(), request, ctx).await
        }
    });

    tokio::time::timeout(Duration::from_secs(secs), run).await.map_err(|_| timeout_error(secs))?
}
