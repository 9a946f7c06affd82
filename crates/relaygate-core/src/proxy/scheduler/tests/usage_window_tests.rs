use async_trait::async_trait;
use relaygate_types::models::{RuntimeStats, SchedulerConfig, UsageEvent};
use relaygate_types::CollaboratorError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Barrier;

use super::{harness_with_ledger, make_credential, FakeOAuth, T0};
use crate::modules::{MemoryCredentialStore, MemoryUsageLedger};
use crate::proxy::clock::ManualClock;
use crate::proxy::collaborators::UsageLedger;
use crate::proxy::scheduler::{CredentialScheduler, HOUR_MS};

const MINUTE_MS: i64 = 60_000;

fn config() -> SchedulerConfig {
    SchedulerConfig { hourly_limit: 2, pool_size: 1, ..SchedulerConfig::default() }
}

#[tokio::test]
async fn test_hourly_window_only_counts_last_hour() {
    let ledger = MemoryUsageLedger::with_events(vec![
        UsageEvent::success("a", T0 - 61 * MINUTE_MS),
        UsageEvent::success("a", T0 - 30 * MINUTE_MS),
    ]);
    let h = harness_with_ledger(config(), vec![make_credential("a"), make_credential("b")], ledger);
    h.scheduler.set_runtime_stats("b", RuntimeStats { last_used: T0 - 10, ..Default::default() });

    let first = h.scheduler.select(&HashSet::new()).await.unwrap();
    assert_eq!(first.id, "a", "one call in the window is under the cap of two");
    assert_eq!(h.scheduler.state.lock().window_count("a"), 2);

    // The optimistic increment put a at its cap, so the sticky slot cannot
    // serve it again.
    let second = h.scheduler.select(&HashSet::new()).await.unwrap();
    assert_eq!(second.id, "b");
}

#[tokio::test]
async fn test_capped_credential_is_skipped() {
    let ledger = MemoryUsageLedger::with_events(vec![
        UsageEvent::success("a", T0 - 30 * MINUTE_MS),
        UsageEvent::success("a", T0 - 10 * MINUTE_MS),
    ]);
    let h = harness_with_ledger(config(), vec![make_credential("a"), make_credential("b")], ledger);
    h.scheduler.set_runtime_stats("b", RuntimeStats { last_used: T0 - 10, ..Default::default() });

    assert_eq!(h.scheduler.select(&HashSet::new()).await.unwrap().id, "b");
}

#[tokio::test]
async fn test_refresh_replaces_cached_count() {
    let ledger = MemoryUsageLedger::with_events(vec![UsageEvent::success("a", T0 - MINUTE_MS)]);
    let h = harness_with_ledger(config(), vec![make_credential("a")], ledger);

    h.scheduler.select(&HashSet::new()).await.unwrap();
    assert_eq!(h.scheduler.state.lock().window_count("a"), 2);

    h.clock.advance(h.scheduler.config().usage_cache_ttl_ms + 1);
    h.scheduler.refresh_usage_cache(&HashSet::new()).await;
    assert_eq!(
        h.scheduler.state.lock().window_count("a"),
        1,
        "ledger count must replace the optimistic count, not add to it"
    );
}

#[tokio::test]
async fn test_fresh_cache_skips_ledger() {
    let ledger = MemoryUsageLedger::with_events(vec![UsageEvent::success("a", T0 - MINUTE_MS)]);
    let h = harness_with_ledger(config(), vec![make_credential("a")], ledger);

    h.scheduler.refresh_usage_cache(&HashSet::new()).await;
    h.ledger.record_outcome(UsageEvent::success("a", T0)).await.unwrap();
    h.scheduler.refresh_usage_cache(&HashSet::new()).await;
    assert_eq!(h.scheduler.state.lock().window_count("a"), 1);

    h.clock.advance(HOUR_MS);
    h.scheduler.refresh_usage_cache(&HashSet::new()).await;
    assert_eq!(h.scheduler.state.lock().window_count("a"), 1, "only the T0 call remains in window");
}

/// Ledger whose counts are only returned once two readers are waiting, so
/// concurrent selections both see the same stale count.
struct GatedLedger {
    gate: Barrier,
    count: u32,
}

#[async_trait]
impl UsageLedger for GatedLedger {
    async fn record_outcome(&self, _event: UsageEvent) -> Result<(), CollaboratorError> {
        Ok(())
    }

    async fn count_since(&self, _credential_id: &str, _since_ms: i64) -> Result<u32, CollaboratorError> {
        self.gate.wait().await;
        Ok(self.count)
    }

    async fn replay_runtime_stats(&self) -> Result<HashMap<String, RuntimeStats>, CollaboratorError> {
        Ok(HashMap::new())
    }
}

#[tokio::test]
async fn test_concurrent_refresh_keeps_optimistic_increment() {
    let credentials = vec![make_credential("a"), make_credential("b")];
    let scheduler = CredentialScheduler::new(
        config(),
        Arc::new(MemoryCredentialStore::new(credentials.clone())),
        Arc::new(GatedLedger { gate: Barrier::new(2), count: 1 }),
        Arc::new(FakeOAuth::default()),
        Arc::new(ManualClock::new(T0)),
    );
    scheduler.set_credentials(credentials);
    scheduler.set_runtime_stats("b", RuntimeStats { last_used: T0 - 10, ..Default::default() });

    let none = HashSet::new();
    let (first, second) = tokio::join!(scheduler.select(&none), scheduler.select(&none));
    let picks = [first.unwrap().id, second.unwrap().id];

    let on_a = picks.iter().filter(|id| *id == "a").count();
    assert_eq!(on_a, 1, "a had one call in the window and a cap of two, got {:?}", picks);
    assert_eq!(scheduler.state.lock().window_count("a"), 2);
}
