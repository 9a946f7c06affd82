//! Credential stores: a JSON file on disk and an in-memory variant.

use async_trait::async_trait;
use parking_lot::RwLock;
use relaygate_types::{CollaboratorError, Credential};
use std::path::PathBuf;

use super::file_utils::{atomic_write_json, read_json_if_exists};
use crate::proxy::collaborators::CredentialStore;

/// Credentials kept as a pretty-printed JSON array.
pub struct JsonCredentialStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, write_lock: tokio::sync::Mutex::new(()) }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for JsonCredentialStore {
    async fn list(&self) -> Result<Vec<Credential>, CollaboratorError> {
        let mut credentials: Vec<Credential> = read_json_if_exists(&self.path)
            .await
            .map_err(|message| CollaboratorError::Io { message })?
            .unwrap_or_default();

        for cred in &mut credentials {
            if cred.id.is_empty() {
                cred.id = Credential::derive_id(cred.project_id.as_deref(), &cred.refresh_token);
            }
        }
        tracing::debug!(
            "[CredentialStore] Loaded {} credentials from {}",
            credentials.len(),
            self.path.display()
        );
        Ok(credentials)
    }

    async fn save(&self, credentials: &[Credential]) -> Result<(), CollaboratorError> {
        let _guard = self.write_lock.lock().await;
        atomic_write_json(&self.path, credentials)
            .await
            .map_err(|message| CollaboratorError::Io { message })
    }
}

/// Non-persistent store, mostly for tests and embedding.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Vec<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials: RwLock::new(credentials) }
    }

    pub fn snapshot(&self) -> Vec<Credential> {
        self.credentials.read().clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn list(&self) -> Result<Vec<Credential>, CollaboratorError> {
        Ok(self.snapshot())
    }

    async fn save(&self, credentials: &[Credential]) -> Result<(), CollaboratorError> {
        *self.credentials.write() = credentials.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCredentialStore::new(dir.path().join("creds.json"));

        assert!(store.list().await.unwrap().is_empty(), "missing file should list empty");

        let mut cred = Credential::new("rt-1".to_string(), "at-1".to_string(), 100, None);
        cred.enabled = false;
        store.save(&[cred.clone()]).await.unwrap();

        let loaded = store.list().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, cred.id);
        assert!(!loaded[0].enabled);
    }

    #[tokio::test]
    async fn test_json_store_derives_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        tokio::fs::write(&path, r#"[{"id": "", "refresh_token": "rt-x", "project_id": "p-9"}]"#)
            .await
            .unwrap();

        let loaded = JsonCredentialStore::new(path).list().await.unwrap();
        assert_eq!(loaded[0].id, "p-9");
        assert!(loaded[0].enabled, "enabled should default to true");
    }
}
