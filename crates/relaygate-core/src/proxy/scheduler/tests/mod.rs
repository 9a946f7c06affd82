mod lifecycle_tests;
mod usage_window_tests;

use async_trait::async_trait;
use parking_lot::Mutex;
use relaygate_types::models::SchedulerConfig;
use relaygate_types::{CollaboratorError, Credential};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::CredentialScheduler;
use crate::modules::{MemoryCredentialStore, MemoryUsageLedger};
use crate::proxy::clock::{Clock, ManualClock};
use crate::proxy::collaborators::{OAuthClient, TokenGrant};

pub(crate) const T0: i64 = 1_700_000_000_000;

pub(crate) fn make_credential(id: &str) -> Credential {
    let mut cred = Credential::new(
        format!("refresh_{id}"),
        format!("tok-{id}"),
        T0 / 1000 + 3600,
        Some(format!("project-{id}")),
    );
    cred.id = id.to_string();
    cred
}

#[derive(Default)]
pub(crate) struct FakeOAuth {
    pub refresh_calls: AtomicU32,
    pub resolve_calls: AtomicU32,
    pub refresh_error: Mutex<Option<CollaboratorError>>,
    pub project_error: Mutex<Option<CollaboratorError>>,
}

#[async_trait]
impl OAuthClient for FakeOAuth {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, CollaboratorError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.refresh_error.lock().clone() {
            return Err(err);
        }
        Ok(TokenGrant {
            access_token: format!("fresh-{refresh_token}-{n}"),
            expires_in: 3600,
            refresh_token: None,
        })
    }

    async fn resolve_project_id(&self, access_token: &str) -> Result<String, CollaboratorError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.project_error.lock().clone() {
            return Err(err);
        }
        Ok(format!("resolved-for-{access_token}"))
    }
}

pub(crate) struct Harness {
    pub scheduler: CredentialScheduler,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryCredentialStore>,
    pub ledger: Arc<MemoryUsageLedger>,
    pub oauth: Arc<FakeOAuth>,
}

pub(crate) fn harness(config: SchedulerConfig, credentials: Vec<Credential>) -> Harness {
    harness_with_ledger(config, credentials, MemoryUsageLedger::new())
}

pub(crate) fn harness_with_ledger(
    config: SchedulerConfig,
    credentials: Vec<Credential>,
    ledger: MemoryUsageLedger,
) -> Harness {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MemoryCredentialStore::new(credentials.clone()));
    let ledger = Arc::new(ledger);
    let oauth = Arc::new(FakeOAuth::default());
    let scheduler = CredentialScheduler::new(
        config,
        store.clone(),
        ledger.clone(),
        oauth.clone(),
        clock.clone() as Arc<dyn Clock>,
    );
    scheduler.set_credentials(credentials);
    Harness { scheduler, clock, store, ledger, oauth }
}
