//! Usage ledgers.
//!
//! [`JsonUsageLedger`] rewrites the whole file on every append, so appends
//! are serialized through a single async mutex.

use async_trait::async_trait;
use parking_lot::Mutex;
use relaygate_types::models::{RuntimeStats, UsageEvent};
use relaygate_types::CollaboratorError;
use std::collections::HashMap;
use std::path::PathBuf;

use super::file_utils::{atomic_write_json, read_json_if_exists};
use crate::proxy::collaborators::UsageLedger;

/// Events older than this are dropped on append.
const RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;

fn replay(events: &[UsageEvent]) -> HashMap<String, RuntimeStats> {
    let mut stats: HashMap<String, RuntimeStats> = HashMap::new();
    for event in events {
        stats.entry(event.credential_id.clone()).or_default().apply(event);
    }
    stats
}

fn count(events: &[UsageEvent], credential_id: &str, since_ms: i64) -> u32 {
    events
        .iter()
        .filter(|e| e.credential_id == credential_id && e.timestamp_ms >= since_ms)
        .count() as u32
}

pub struct JsonUsageLedger {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonUsageLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path, write_lock: tokio::sync::Mutex::new(()) }
    }

    async fn load(&self) -> Result<Vec<UsageEvent>, CollaboratorError> {
        read_json_if_exists(&self.path)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|message| CollaboratorError::Io { message })
    }
}

#[async_trait]
impl UsageLedger for JsonUsageLedger {
    async fn record_outcome(&self, event: UsageEvent) -> Result<(), CollaboratorError> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.load().await?;
        let horizon = event.timestamp_ms - RETENTION_MS;
        events.retain(|e| e.timestamp_ms >= horizon);
        events.push(event);
        atomic_write_json(&self.path, &events)
            .await
            .map_err(|message| CollaboratorError::Io { message })
    }

    async fn count_since(
        &self,
        credential_id: &str,
        since_ms: i64,
    ) -> Result<u32, CollaboratorError> {
        Ok(count(&self.load().await?, credential_id, since_ms))
    }

    async fn replay_runtime_stats(&self) -> Result<HashMap<String, RuntimeStats>, CollaboratorError> {
        Ok(replay(&self.load().await?))
    }
}

#[derive(Default)]
pub struct MemoryUsageLedger {
    events: Mutex<Vec<UsageEvent>>,
}

impl MemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<UsageEvent>) -> Self {
        Self { events: Mutex::new(events) }
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl UsageLedger for MemoryUsageLedger {
    async fn record_outcome(&self, event: UsageEvent) -> Result<(), CollaboratorError> {
        self.events.lock().push(event);
        Ok(())
    }

    async fn count_since(
        &self,
        credential_id: &str,
        since_ms: i64,
    ) -> Result<u32, CollaboratorError> {
        Ok(count(&self.events.lock(), credential_id, since_ms))
    }

    async fn replay_runtime_stats(&self) -> Result<HashMap<String, RuntimeStats>, CollaboratorError> {
        Ok(replay(&self.events.lock()))
    }
}
