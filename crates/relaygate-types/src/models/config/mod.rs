//! Application configuration.

mod scheduling;
mod server;

pub use scheduling::{RetryConfig, SchedulerConfig};
pub use server::{LoggingConfig, ServerConfig, StorageConfig, UpstreamConfig};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Root configuration file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,
    #[serde(default)]
    #[validate(nested)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.retryable_statuses, vec![500]);
        assert_eq!(config.server.port, 8045);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"scheduler": {"hourly_limit": 2}}"#).unwrap();
        assert_eq!(config.scheduler.hourly_limit, 2);
        assert_eq!(config.scheduler.max_sticky_usage, 5);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.scheduler.pool_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retry.jitter_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.upstream.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
