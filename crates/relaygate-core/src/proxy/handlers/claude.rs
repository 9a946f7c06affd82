// Claude messages handler
use axum::{extract::State, response::Response, Json};
use relaygate_types::ProxyError;
use serde_json::Value;

use super::common::{
    dispatch_stream, dispatch_unary, error_response, json_response, sse_response, Dialect,
};
use crate::proxy::mappers::claude::{
    build_claude_response, claude_to_openai_request, create_claude_sse_stream, ClaudeRequest,
};
use crate::proxy::mappers::openai::transform_openai_request;
use crate::proxy::orchestrator::Dispatched;
use crate::proxy::server::AppState;

/// POST /v1/messages
pub async fn handle_messages(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    const DIALECT: Dialect = Dialect::Claude;

    let request: ClaudeRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => {
            let err = ProxyError::Protocol { message: format!("Invalid request body: {}", e) };
            return error_response(DIALECT, &err);
        },
    };

    tracing::info!(
        "[Claude] model={} stream={} messages={} thinking={}",
        request.model,
        request.stream,
        request.messages.len(),
        request.thinking.as_ref().and_then(|t| t.budget()).is_some()
    );

    let internal = match claude_to_openai_request(&request)
        .and_then(|bridged| transform_openai_request(&bridged, &state.adapter.signature_cache))
    {
        Ok(internal) => internal,
        Err(e) => return error_response(DIALECT, &e),
    };
    let model = request.model;

    if internal.stream {
        match dispatch_stream(&state, DIALECT, internal).await {
            Ok(Dispatched { value, credential, record }) => {
                let encoded = create_claude_sse_stream(value, model);
                sse_response(&state, DIALECT, &credential, &record, encoded)
            },
            Err(e) => error_response(DIALECT, &e),
        }
    } else {
        match dispatch_unary(&state, DIALECT, internal).await {
            Ok(Dispatched { value, credential, record }) => {
                let body = build_claude_response(&value, &model);
                json_response(&credential, &record, &body)
            },
            Err(e) => error_response(DIALECT, &e),
        }
    }
}
