// Native generateContent handlers
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use relaygate_types::ProxyError;
use serde_json::{json, Value};

use super::common::{
    dispatch_stream, dispatch_unary, error_response, json_response, sse_response, Dialect,
};
use super::models::SUPPORTED_MODELS;
use crate::proxy::mappers::gemini::{
    build_gemini_response, create_gemini_sse_stream, transform_gemini_request,
};
use crate::proxy::orchestrator::Dispatched;
use crate::proxy::server::AppState;

const DIALECT: Dialect = Dialect::Gemini;

/// Split `gemini-2.5-pro:streamGenerateContent` into model and stream flag.
pub fn parse_model_action(model_action: &str) -> Result<(&str, bool), ProxyError> {
    let Some((model, action)) = model_action.rsplit_once(':') else {
        return Err(ProxyError::Protocol {
            message: format!("missing method in path segment '{}'", model_action),
        });
    };
    let stream = match action {
        "generateContent" => false,
        "streamGenerateContent" => true,
        other => {
            return Err(ProxyError::Protocol { message: format!("unsupported method '{}'", other) })
        },
    };
    if model.is_empty() {
        return Err(ProxyError::Protocol { message: "model is required".to_string() });
    }
    Ok((model, stream))
}

fn model_entry(id: &str) -> Value {
    json!({
        "name": format!("models/{}", id),
        "version": "001",
        "displayName": id,
        "inputTokenLimit": 1_048_576,
        "outputTokenLimit": 65_536,
        "supportedGenerationMethods": ["generateContent", "streamGenerateContent"]
    })
}

/// GET /v1beta/models
pub async fn handle_list_models() -> Json<Value> {
    let models: Vec<Value> = SUPPORTED_MODELS.iter().map(|id| model_entry(id)).collect();
    Json(json!({ "models": models }))
}

/// GET /v1beta/models/:model
pub async fn handle_get_model(Path(model): Path<String>) -> Response {
    if SUPPORTED_MODELS.contains(&model.as_str()) {
        Json(model_entry(&model)).into_response()
    } else {
        let err = ProxyError::Upstream {
            status: 404,
            message: format!("Model {} not found", model),
            retry_after_secs: None,
        };
        error_response(DIALECT, &err)
    }
}

/// POST /v1beta/models/:model_action
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(model_action): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let (model, stream) = match parse_model_action(&model_action) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(DIALECT, &e),
    };

    tracing::info!("[Gemini-Wrap] model={} stream={}", model, stream);

    let internal =
        match transform_gemini_request(body, model, stream, &state.adapter.signature_cache) {
            Ok(internal) => internal,
            Err(e) => return error_response(DIALECT, &e),
        };
    let model = model.to_string();

    if stream {
        match dispatch_stream(&state, DIALECT, internal).await {
            Ok(Dispatched { value, credential, record }) => {
                let encoded = create_gemini_sse_stream(value, model);
                sse_response(&state, DIALECT, &credential, &record, encoded)
            },
            Err(e) => error_response(DIALECT, &e),
        }
    } else {
        match dispatch_unary(&state, DIALECT, internal).await {
            Ok(Dispatched { value, credential, record }) => {
                let body = build_gemini_response(&value, &model);
                json_response(&credential, &record, &body)
            },
            Err(e) => error_response(DIALECT, &e),
        }
    }
}
