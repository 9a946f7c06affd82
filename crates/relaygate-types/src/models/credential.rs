//! Credential - one upstream OAuth identity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

fn new_session_id() -> String {
    format!("-{}", uuid::Uuid::new_v4().simple())
}

/// One upstream OAuth identity usable to make backend calls.
///
/// Owned by the credential store; `enabled` is only ever flipped by the
/// scheduler. `session_id` is regenerated every process start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry as unix seconds.
    #[serde(default)]
    pub expires_at: i64,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
    #[serde(skip, default = "new_session_id")]
    pub session_id: String,
}

fn default_enabled() -> bool {
    true
}

impl Credential {
    pub fn new(
        refresh_token: String,
        access_token: String,
        expires_at: i64,
        project_id: Option<String>,
    ) -> Self {
        let id = Self::derive_id(project_id.as_deref(), &refresh_token);
        Self {
            id,
            email: None,
            access_token,
            refresh_token,
            expires_at,
            project_id,
            enabled: true,
            disabled_reason: None,
            session_id: new_session_id(),
        }
    }

    /// Stable identifier: the upstream project id when known, otherwise a
    /// fingerprint of the refresh token.
    pub fn derive_id(project_id: Option<&str>, refresh_token: &str) -> String {
        match project_id {
            Some(pid) if !pid.is_empty() => pid.to_string(),
            _ => Self::fingerprint(refresh_token),
        }
    }

    /// First 16 hex chars of sha256(refresh_token).
    pub fn fingerprint(refresh_token: &str) -> String {
        let digest = Sha256::digest(refresh_token.as_bytes());
        digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
    }

    /// True when the access token is missing or expires within `skew_secs`.
    pub fn needs_refresh(&self, now_secs: i64, skew_secs: i64) -> bool {
        self.access_token.is_empty() || now_secs >= self.expires_at - skew_secs
    }

    pub fn has_project(&self) -> bool {
        self.project_id.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Display label for logs.
    pub fn label(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefers_project() {
        let with_project =
            Credential::new("rt".to_string(), "at".to_string(), 0, Some("proj-1".to_string()));
        assert_eq!(with_project.id, "proj-1");

        let without = Credential::new("rt".to_string(), "at".to_string(), 0, None);
        assert_eq!(without.id.len(), 16);
        assert_eq!(without.id, Credential::fingerprint("rt"));
    }

    #[test]
    fn test_needs_refresh_window() {
        let cred = Credential::new("rt".to_string(), "at".to_string(), 1_000, None);
        assert!(!cred.needs_refresh(600, 300));
        assert!(cred.needs_refresh(700, 300));

        let empty = Credential::new("rt".to_string(), String::new(), 10_000, None);
        assert!(empty.needs_refresh(0, 300));
    }

    #[test]
    fn test_session_id_not_persisted() {
        let cred = Credential::new("rt".to_string(), "at".to_string(), 0, None);
        let json = serde_json::to_string(&cred).unwrap();
        assert!(!json.contains("session_id"));

        let restored: Credential = serde_json::from_str(&json).unwrap();
        assert!(restored.session_id.starts_with('-'));
        assert_ne!(restored.session_id, cred.session_id);
        assert!(restored.enabled);
    }
}
