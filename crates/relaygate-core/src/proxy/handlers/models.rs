use axum::Json;
use serde_json::{json, Value};

/// Model ids advertised to clients. Requests for other ids are still
/// forwarded; the upstream decides.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.5-flash-image",
    "gemini-3-pro-preview",
    "gemini-3-flash-preview",
];

/// GET /v1/models
pub async fn handle_list_models() -> Json<Value> {
    let data: Vec<Value> = SUPPORTED_MODELS
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "object": "model",
                "created": 1_706_745_600,
                "owned_by": "relaygate"
            })
        })
        .collect();

    Json(json!({ "object": "list", "data": data }))
}
