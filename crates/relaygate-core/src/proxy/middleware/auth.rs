use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use relaygate_types::models::ServerConfig;

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn is_health_check(path: &str) -> bool {
    path == "/health" || path == "/healthz"
}

/// Stored images are linked from model output and fetched by renderers
/// that carry no key; their names are content hashes.
fn is_public_path(path: &str) -> bool {
    is_health_check(path) || path.starts_with("/images/")
}

/// Client key from, in order: `Authorization: Bearer`, `x-api-key`,
/// `x-goog-api-key`, then the `key` query parameter.
fn extract_api_key(request: &Request) -> Option<String> {
    let headers = request.headers();
    let from_headers = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s))
        .or_else(|| headers.get("x-api-key").and_then(|h| h.to_str().ok()))
        .or_else(|| headers.get("x-goog-api-key").and_then(|h| h.to_str().ok()));

    if let Some(key) = from_headers {
        return Some(key.trim().to_string());
    }

    request.uri().query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == "key")
            .map(|(_, value)| value.into_owned())
    })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {
                "message": "Invalid or missing API key",
                "type": "authentication_error",
                "code": 401
            }
        })),
    )
        .into_response()
}

pub async fn auth_middleware(
    State(config): State<Arc<ServerConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let health = is_health_check(&path);

    if health {
        tracing::trace!("Health: {} {}", method, path);
    } else {
        tracing::info!("Request: {} {}", method, path);
    }

    if method == Method::OPTIONS || is_public_path(&path) || !config.auth_enabled() {
        return next.run(request).await;
    }

    let authorized =
        extract_api_key(&request).is_some_and(|k| constant_time_compare(&k, &config.api_key));

    if authorized {
        next.run(request).await
    } else {
        tracing::warn!("[Auth] Rejected {} {}: invalid or missing API key", method, path);
        unauthorized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};
    use axum::{middleware, routing::get, Router};
    use axum_test::TestServer;

    fn h(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
        (HeaderName::from_static(name), HeaderValue::from_static(value))
    }

    fn app(api_key: &str) -> TestServer {
        let config = Arc::new(ServerConfig { api_key: api_key.to_string(), ..Default::default() });
        let router = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/v1/models", get(|| async { "models" }))
            .layer(middleware::from_fn_with_state(config, auth_middleware));
        TestServer::new(router).unwrap()
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("ab", "abc"));
    }

    #[tokio::test]
    async fn test_auth_disabled_without_key() {
        let server = app("");
        server.get("/v1/models").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_or_wrong_key_rejected() {
        let server = app("sk-secret");
        server.get("/v1/models").await.assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = h("authorization", "Bearer sk-wrong");
        let response = server.get("/v1/models").add_header(name, value).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_accepted_key_locations() {
        let server = app("sk-secret");

        for (name, value) in [
            h("authorization", "Bearer sk-secret"),
            h("x-api-key", "sk-secret"),
            h("x-goog-api-key", "sk-secret"),
        ] {
            server.get("/v1/models").add_header(name, value).await.assert_status_ok();
        }
        server.get("/v1/models").add_query_param("key", "sk-secret").await.assert_status_ok();
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/images/abc.png"));
        assert!(!is_public_path("/v1/chat/completions"));
    }

    #[tokio::test]
    async fn test_health_is_exempt() {
        let server = app("sk-secret");
        server.get("/health").await.assert_status_ok();
    }
}
