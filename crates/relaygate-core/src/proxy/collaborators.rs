//! External collaborators consumed by the core.
//!
//! The scheduler and adapter only see these traits; default file-backed
//! implementations live in [`crate::modules`].

use async_trait::async_trait;
use relaygate_types::models::{RuntimeStats, UsageEvent};
use relaygate_types::{CollaboratorError, Credential};
use std::collections::HashMap;

/// Durable list of credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Credential>, CollaboratorError>;
    async fn save(&self, credentials: &[Credential]) -> Result<(), CollaboratorError>;
}

/// Append-only record of dispatch outcomes.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    async fn record_outcome(&self, event: UsageEvent) -> Result<(), CollaboratorError>;
    /// Number of recorded calls for `credential_id` at or after `since_ms`.
    async fn count_since(&self, credential_id: &str, since_ms: i64)
        -> Result<u32, CollaboratorError>;
    async fn replay_runtime_stats(&self)
        -> Result<HashMap<String, RuntimeStats>, CollaboratorError>;
}

/// Blob storage for inline images returned by the upstream.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist base64 `data` and return a URL clients can fetch.
    async fn store(&self, data_base64: &str, mime_type: &str) -> Result<String, CollaboratorError>;
}

/// Result of a refresh-token grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
}

#[async_trait]
pub trait OAuthClient: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, CollaboratorError>;
    async fn resolve_project_id(&self, access_token: &str) -> Result<String, CollaboratorError>;
}
