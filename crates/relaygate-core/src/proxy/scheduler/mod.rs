//! Credential scheduler.
//!
//! Owns the in-memory runtime stats, the sticky session slot and the hourly
//! usage cache. Every state mutation happens inside one short,
//! I/O-free critical section guarded by `state`; ledger, store and OAuth
//! calls are made after the guard is dropped.

mod selection;
mod selection_helpers;
mod token_refresh;
mod usage_cache;

#[cfg(test)]
pub(crate) mod tests;

use dashmap::DashMap;
use parking_lot::Mutex;
use relaygate_types::models::{RuntimeStats, SchedulerConfig, UsageEvent};
use relaygate_types::{CollaboratorError, Credential};
use std::collections::HashMap;
use std::sync::Arc;

use crate::proxy::clock::Clock;
use crate::proxy::collaborators::{CredentialStore, OAuthClient, UsageLedger};

pub use selection_helpers::weighted_pick;
pub use usage_cache::{UsageCacheEntry, HOUR_MS};

/// Single process-wide affinity slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickySession {
    pub credential_id: String,
    pub uses_remaining: u32,
}

#[derive(Debug, Default)]
pub(crate) struct SchedulerState {
    /// All known credentials, disabled ones included so they persist.
    pub(crate) credentials: Vec<Credential>,
    pub(crate) stats: HashMap<String, RuntimeStats>,
    pub(crate) sticky: Option<StickySession>,
    pub(crate) usage_cache: HashMap<String, UsageCacheEntry>,
}

impl SchedulerState {
    fn find_mut(&mut self, credential_id: &str) -> Option<&mut Credential> {
        self.credentials.iter_mut().find(|c| c.id == credential_id)
    }

    fn release_sticky_for(&mut self, credential_id: &str) {
        if self.sticky.as_ref().is_some_and(|s| s.credential_id == credential_id) {
            self.sticky = None;
        }
    }
}

pub struct CredentialScheduler {
    state: Mutex<SchedulerState>,
    config: SchedulerConfig,
    store: Arc<dyn CredentialStore>,
    ledger: Arc<dyn UsageLedger>,
    oauth: Arc<dyn OAuthClient>,
    clock: Arc<dyn Clock>,
    refresh_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    persist_lock: tokio::sync::Mutex<()>,
}

impl CredentialScheduler {
    pub fn new(
        config: SchedulerConfig,
        store: Arc<dyn CredentialStore>,
        ledger: Arc<dyn UsageLedger>,
        oauth: Arc<dyn OAuthClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            config,
            store,
            ledger,
            oauth,
            clock,
            refresh_locks: DashMap::new(),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Load credentials from the store and rebuild runtime stats from the
    /// ledger. Returns the number of enabled credentials.
    pub async fn load(&self) -> Result<usize, CollaboratorError> {
        let credentials = self.store.list().await?;
        let stats = match self.ledger.replay_runtime_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("[Scheduler] Ledger replay failed, starting with empty stats: {}", e);
                HashMap::new()
            },
        };

        let enabled = credentials.iter().filter(|c| c.enabled).count();
        tracing::info!(
            "[Scheduler] Loaded {} credentials ({} enabled), stats for {}",
            credentials.len(),
            enabled,
            stats.len()
        );

        let mut state = self.state.lock();
        state.credentials = credentials;
        state.stats = stats;
        state.sticky = None;
        state.usage_cache.clear();
        Ok(enabled)
    }

    /// Replace the credential set without touching the store.
    pub fn set_credentials(&self, credentials: Vec<Credential>) {
        self.state.lock().credentials = credentials;
    }

    pub fn set_runtime_stats(&self, credential_id: &str, stats: RuntimeStats) {
        self.state.lock().stats.insert(credential_id.to_string(), stats);
    }

    pub fn credentials(&self) -> Vec<Credential> {
        self.state.lock().credentials.clone()
    }

    pub fn credential(&self, credential_id: &str) -> Option<Credential> {
        self.state.lock().credentials.iter().find(|c| c.id == credential_id).cloned()
    }

    pub fn runtime_stats(&self, credential_id: &str) -> RuntimeStats {
        self.state.lock().stats.get(credential_id).copied().unwrap_or_default()
    }

    pub fn sticky_session(&self) -> Option<StickySession> {
        self.state.lock().sticky.clone()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// True when the credential is enabled, out of cooldown and under its
    /// hourly cap according to the current usage cache.
    pub fn is_eligible(&self, credential_id: &str) -> bool {
        let now = self.clock.now_ms();
        let state = self.state.lock();
        state
            .credentials
            .iter()
            .find(|c| c.id == credential_id)
            .is_some_and(|c| c.enabled && state.is_eligible(&c.id, &self.config, now))
    }

    pub fn in_cooldown(&self, credential_id: &str) -> bool {
        let now = self.clock.now_ms();
        self.runtime_stats(credential_id).in_cooldown(now, self.config.cooldown_ms)
    }

    /// Reset the failure streak and stamp `last_used`.
    pub async fn record_success(&self, credential_id: &str) {
        let now = self.clock.now_ms();
        self.state.lock().stats.entry(credential_id.to_string()).or_default().record_success(now);

        if let Err(e) = self.ledger.record_outcome(UsageEvent::success(credential_id, now)).await {
            tracing::warn!("[Scheduler] Failed to record success for {}: {}", credential_id, e);
        }
    }

    /// Count a failure. A 429 starts the cooldown; any failure releases the
    /// sticky slot if it points at this credential.
    pub async fn record_failure(&self, credential_id: &str, status: u16) {
        let now = self.clock.now_ms();
        let rate_limited = status == 429;
        {
            let mut state = self.state.lock();
            state
                .stats
                .entry(credential_id.to_string())
                .or_default()
                .record_failure(now, rate_limited);
            state.release_sticky_for(credential_id);
        }

        if rate_limited {
            tracing::warn!(
                "[Scheduler] {} rate limited, cooling down for {}ms",
                credential_id,
                self.config.cooldown_ms
            );
        }

        let event = UsageEvent::failure(credential_id, now, status);
        if let Err(e) = self.ledger.record_outcome(event).await {
            tracing::warn!("[Scheduler] Failed to record failure for {}: {}", credential_id, e);
        }
    }

    /// Permanently disable a credential and persist the change.
    pub async fn disable(&self, credential_id: &str, reason: &str) {
        let changed = {
            let mut state = self.state.lock();
            state.release_sticky_for(credential_id);
            state.usage_cache.remove(credential_id);
            match state.find_mut(credential_id) {
                Some(cred) if cred.enabled => {
                    cred.enabled = false;
                    cred.disabled_reason = Some(reason.to_string());
                    true
                },
                _ => false,
            }
        };

        if changed {
            tracing::error!("[Scheduler] Disabled credential {}: {}", credential_id, reason);
            self.persist().await;
        }
    }

    /// Write the current credential list back to the store.
    pub(crate) async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.state.lock().credentials.clone();
        if let Err(e) = self.store.save(&snapshot).await {
            tracing::warn!("[Scheduler] Failed to persist credentials: {}", e);
        }
    }
}
