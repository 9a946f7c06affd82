//! Proxy-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while serving a client request.
///
/// Each variant carries exactly the fields its retry policy needs.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ProxyError {
    /// Upstream rejected the credential (401/403 or embedded auth failure)
    #[error("Authentication failed (status {status}): {message}")]
    AuthFailed { status: u16, message: String },

    /// Rate limited by upstream (429)
    #[error("Rate limited: {message}{}", retry_after_secs.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Upstream returned a non-success status
    #[error("Upstream error {status}: {message}")]
    Upstream {
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Pool exhausted or every credential excluded
    #[error("No credential available: {reason}")]
    NoCredentialAvailable { reason: String },

    /// Malformed or incomplete client request
    #[error("Invalid request: {message}")]
    Protocol { message: String },

    /// A single streaming frame could not be decoded
    #[error("Frame decode error: {message}")]
    FrameDecode { message: String },

    /// Transport failure after the stream started
    #[error("Stream error: {message}")]
    Stream { message: String },

    /// Internal proxy error (bugs, unexpected states)
    #[error("Internal proxy error: {message}")]
    Internal { message: String },
}

impl ProxyError {
    /// Check if this is a client error (4xx equivalent, never retried).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Retry hint surfaced to the client, if any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs, .. } | Self::Upstream { retry_after_secs, .. } => {
                *retry_after_secs
            },
            _ => None,
        }
    }

    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::AuthFailed { .. } => 401,
            Self::RateLimited { .. } => 429,
            Self::Upstream { status, .. } if (400..600).contains(status) => *status,
            Self::Upstream { .. } => 502,
            Self::NoCredentialAvailable { .. } => 503,
            Self::Protocol { .. } => 400,
            Self::FrameDecode { .. } | Self::Stream { .. } => 502,
            Self::Internal { .. } => 500,
        }
    }

    /// Short machine-readable kind used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthFailed { .. } => "authentication_error",
            Self::RateLimited { .. } => "rate_limit_error",
            Self::Upstream { .. } => "upstream_error",
            Self::NoCredentialAvailable { .. } => "overloaded_error",
            Self::Protocol { .. } => "invalid_request_error",
            Self::FrameDecode { .. } | Self::Stream { .. } => "stream_error",
            Self::Internal { .. } => "api_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            ProxyError::RateLimited { message: "slow down".to_string(), retry_after_secs: None }
                .http_status_code(),
            429
        );
        assert_eq!(ProxyError::Protocol { message: "bad".to_string() }.http_status_code(), 400);
        assert_eq!(
            ProxyError::Upstream { status: 500, message: "boom".to_string(), retry_after_secs: None }
                .http_status_code(),
            500
        );
        assert_eq!(
            ProxyError::Upstream { status: 0, message: "reset".to_string(), retry_after_secs: None }
                .http_status_code(),
            502
        );
    }

    #[test]
    fn test_retry_after_only_on_rate_and_upstream() {
        let limited =
            ProxyError::RateLimited { message: "x".to_string(), retry_after_secs: Some(12) };
        let auth = ProxyError::AuthFailed { status: 401, message: "x".to_string() };

        assert_eq!(limited.retry_after_secs(), Some(12));
        assert_eq!(auth.retry_after_secs(), None);
        assert!(ProxyError::Protocol { message: "x".to_string() }.is_client_error());
        assert!(!auth.is_client_error());
    }
}
