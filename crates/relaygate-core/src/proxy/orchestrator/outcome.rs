use relaygate_types::models::RetryConfig;
use relaygate_types::ProxyError;
use std::time::Duration;

/// Failure reported by one dispatch against one credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// HTTP status, or 0 for a transport failure before any response.
    pub status: u16,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl UpstreamFailure {
    pub fn new(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        Self { status, message, retry_after }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self { status: 0, message: message.into(), retry_after: None }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    pub fn is_transport(&self) -> bool {
        self.status == 0
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after.map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0))
    }

    /// Terminal error surfaced to the client.
    pub fn into_error(self) -> ProxyError {
        let retry_after_secs = self.retry_after_secs();
        match self.status {
            401 | 403 => ProxyError::AuthFailed { status: self.status, message: self.message },
            429 => ProxyError::RateLimited { message: self.message, retry_after_secs },
            status => ProxyError::Upstream { status, message: self.message, retry_after_secs },
        }
    }
}

/// What the orchestrator does next after a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Disable the credential permanently.
    Disable,
    /// Retry the same credential without consuming an attempt.
    RetrySame,
    /// Exclude the credential and select another, consuming an attempt.
    Switch,
    /// Surface immediately.
    Fatal,
}

/// Classify a failure. `rate_limited_before` is true when the previous
/// dispatch on this same credential was already a 429.
pub fn classify(failure: &UpstreamFailure, rate_limited_before: bool, config: &RetryConfig) -> Outcome {
    if failure.is_auth() {
        return Outcome::Disable;
    }
    if failure.is_rate_limited() {
        return if rate_limited_before { Outcome::Switch } else { Outcome::RetrySame };
    }
    if failure.is_transport() || config.is_retryable(failure.status) {
        return Outcome::Switch;
    }
    Outcome::Fatal
}
