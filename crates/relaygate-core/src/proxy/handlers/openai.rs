// OpenAI chat completions handler
use axum::{extract::State, response::Response, Json};
use relaygate_types::ProxyError;
use serde_json::Value;

use super::common::{
    dispatch_stream, dispatch_unary, error_response, json_response, sse_response, Dialect,
};
use crate::proxy::mappers::openai::{
    build_openai_response, create_openai_sse_stream, transform_openai_request, OpenAIRequest,
};
use crate::proxy::mappers::InternalRequest;
use crate::proxy::orchestrator::Dispatched;
use crate::proxy::server::AppState;

/// POST /v1/chat/completions
pub async fn handle_chat_completions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let request: OpenAIRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => {
            let err = ProxyError::Protocol { message: format!("Invalid request body: {}", e) };
            return error_response(Dialect::OpenAI, &err);
        },
    };

    tracing::info!(
        "[OpenAI] model={} stream={} messages={} tools={}",
        request.model,
        request.stream,
        request.messages.len(),
        request.tools.as_ref().map_or(0, Vec::len)
    );

    match transform_openai_request(&request, &state.adapter.signature_cache) {
        Ok(internal) => respond(&state, Dialect::OpenAI, internal).await,
        Err(e) => error_response(Dialect::OpenAI, &e),
    }
}

async fn respond(state: &AppState, dialect: Dialect, internal: InternalRequest) -> Response {
    let model = internal.model.clone();
    if internal.stream {
        match dispatch_stream(state, dialect, internal).await {
            Ok(Dispatched { value, credential, record }) => {
                let encoded = create_openai_sse_stream(value, model);
                sse_response(state, dialect, &credential, &record, encoded)
            },
            Err(e) => error_response(dialect, &e),
        }
    } else {
        match dispatch_unary(state, dialect, internal).await {
            Ok(Dispatched { value, credential, record }) => {
                let body = build_openai_response(&value, &model);
                json_response(&credential, &record, &body)
            },
            Err(e) => error_response(dialect, &e),
        }
    }
}
