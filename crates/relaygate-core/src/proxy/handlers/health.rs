use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::proxy::server::AppState;

/// GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let scheduler = state.orchestrator.scheduler();
    let credentials = scheduler.credentials();
    let enabled = credentials.iter().filter(|c| c.enabled).count();
    let cooling = credentials.iter().filter(|c| c.enabled && scheduler.in_cooldown(&c.id)).count();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "credentials": {
            "total": credentials.len(),
            "enabled": enabled,
            "cooling_down": cooling
        },
        "signature_cache": {
            "tools": state.adapter.signature_cache.tool_len(),
            "texts": state.adapter.signature_cache.text_len()
        }
    }))
}
