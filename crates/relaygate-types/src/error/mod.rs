//! Error enums shared across the workspace.
//!
//! - `ProxyError`: request-level failures, rendered in each dialect's envelope
//! - `CollaboratorError`: store, ledger, OAuth and image store failures
//! - `ConfigError`: startup configuration failures

mod collaborator;
mod config;
mod proxy;

pub use collaborator::CollaboratorError;
pub use config::ConfigError;
pub use proxy::ProxyError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_error_serializes_tagged() {
        let err = ProxyError::NoCredentialAvailable { reason: "all excluded".to_string() };

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "NoCredentialAvailable");
        assert_eq!(json["details"]["reason"], "all excluded");

        let back: ProxyError = serde_json::from_value(json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn test_rate_limited_display_includes_hint() {
        let err = ProxyError::RateLimited {
            message: "quota exhausted".to_string(),
            retry_after_secs: Some(60),
        };

        let msg = err.to_string();
        assert!(msg.contains("quota exhausted"));
        assert!(msg.contains("retry after 60s"));
    }
}
