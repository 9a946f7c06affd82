use reqwest::{header, Response};
use std::time::Duration;

use crate::proxy::orchestrator::UpstreamFailure;
use crate::proxy::rate_limit::{extract_error_message, parse_retry_delay};

pub fn build_url(base_url: &str, method: &str, query_string: Option<&str>) -> String {
    if let Some(qs) = query_string {
        format!("{}:{}?{}", base_url, method, qs)
    } else {
        format!("{}:{}", base_url, method)
    }
}

pub fn build_headers(access_token: &str, user_agent: &str) -> Result<header::HeaderMap, String> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| e.to_string())?,
    );
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(user_agent).map_err(|e| e.to_string())?,
    );
    Ok(headers)
}

/// Turn a non-success response into a failure, consuming the body.
pub async fn failure_from_response(response: Response) -> UpstreamFailure {
    let status = response.status().as_u16();
    let retry_after_header = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    let retry_after = parse_retry_delay(retry_after_header.as_deref(), &body);
    let message = extract_error_message(&body);
    tracing::warn!(
        "[Upstream] status {} (retry hint: {:?}): {}",
        status,
        retry_after.map(|d| d.as_millis()),
        message
    );
    UpstreamFailure::new(status, message, retry_after)
}

pub fn transport_failure(error: &reqwest::Error) -> UpstreamFailure {
    tracing::error!("[Upstream] HTTP request failed: {}", error);
    UpstreamFailure::transport(format!("HTTP request failed: {}", error))
}

/// Connection-level timeout for the shared client.
pub fn connect_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}
