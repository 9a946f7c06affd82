use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Permissive CORS for browser-based SDK clients. Authentication still
/// applies to every non-preflight request.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600))
}
