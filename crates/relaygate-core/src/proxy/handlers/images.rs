use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::modules::image_store::{is_valid_image_name, mime_for_file};
use crate::proxy::server::AppState;

/// GET /images/:name - serve an image the adapter stored.
pub async fn handle_get_image(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let Some(store) = state.images.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !is_valid_image_name(&name) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match store.load(&name).await {
        Some(bytes) => (
            [
                (header::CONTENT_TYPE, mime_for_file(&name)),
                (header::CACHE_CONTROL, "public, max-age=86400, immutable"),
            ],
            bytes,
        )
            .into_response(),
        None => {
            tracing::debug!("[ImageStore] {} not found", name);
            StatusCode::NOT_FOUND.into_response()
        },
    }
}
