use relaygate_types::models::{RuntimeStats, SchedulerConfig, UsageEvent};
use relaygate_types::CollaboratorError;
use std::collections::HashSet;
use std::sync::atomic::Ordering;

use super::{harness, harness_with_ledger, make_credential, T0};
use crate::modules::MemoryUsageLedger;

/// Single-candidate pool with `b` recently used, so `a` is always tried first.
fn a_first(h: &super::Harness) {
    h.scheduler.set_runtime_stats("b", RuntimeStats { last_used: T0 - 10, ..Default::default() });
}

fn lru_only() -> SchedulerConfig {
    SchedulerConfig { pool_size: 1, ..SchedulerConfig::default() }
}

#[tokio::test]
async fn test_expired_token_refreshed_and_persisted() {
    let mut cred = make_credential("a");
    cred.expires_at = 0;
    let h = harness(SchedulerConfig::default(), vec![cred]);

    let selected = h.scheduler.select(&HashSet::new()).await.unwrap();
    assert_eq!(selected.access_token, "fresh-refresh_a-1");
    assert_eq!(selected.expires_at, T0 / 1000 + 3600);
    assert_eq!(h.oauth.refresh_calls.load(Ordering::SeqCst), 1);

    let stored = h.store.snapshot();
    assert_eq!(stored[0].access_token, "fresh-refresh_a-1");

    // Second selection sees the refreshed token and does not refresh again.
    h.scheduler.select(&HashSet::new()).await.unwrap();
    assert_eq!(h.oauth.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_token_inside_skew_is_refreshed() {
    let mut cred = make_credential("a");
    cred.expires_at = T0 / 1000 + 299;
    let h = harness(SchedulerConfig::default(), vec![cred]);

    h.scheduler.select(&HashSet::new()).await.unwrap();
    assert_eq!(h.oauth.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_revoked_refresh_token_disables_credential() {
    let mut bad = make_credential("a");
    bad.expires_at = 0;
    let h = harness(lru_only(), vec![bad, make_credential("b")]);
    a_first(&h);
    *h.oauth.refresh_error.lock() =
        Some(CollaboratorError::Rejected { message: "invalid_grant".to_string() });

    for _ in 0..3 {
        assert_eq!(h.scheduler.select(&HashSet::new()).await.unwrap().id, "b");
    }
    let a = h.scheduler.credential("a").unwrap();
    assert!(!a.enabled);
    assert!(a.disabled_reason.unwrap().contains("invalid_grant"));
    assert!(!h.store.snapshot().iter().find(|c| c.id == "a").unwrap().enabled);
}

#[tokio::test]
async fn test_transient_refresh_failure_skips_without_disabling() {
    let mut flaky = make_credential("a");
    flaky.expires_at = 0;
    let h = harness(lru_only(), vec![flaky, make_credential("b")]);
    a_first(&h);
    *h.oauth.refresh_error.lock() =
        Some(CollaboratorError::Http { message: "connection reset".to_string() });

    assert_eq!(h.scheduler.select(&HashSet::new()).await.unwrap().id, "b");
    assert!(h.scheduler.credential("a").unwrap().enabled);
}

#[tokio::test]
async fn test_missing_project_resolved_lazily() {
    let mut cred = make_credential("a");
    cred.project_id = None;
    let h = harness(SchedulerConfig::default(), vec![cred]);

    let selected = h.scheduler.select(&HashSet::new()).await.unwrap();
    assert_eq!(selected.project_id.as_deref(), Some("resolved-for-tok-a"));
    assert_eq!(h.oauth.resolve_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.scheduler.credential("a").unwrap().project_id.as_deref(),
        Some("resolved-for-tok-a")
    );
}

#[tokio::test]
async fn test_project_resolution_failure_disables_and_retries() {
    let mut cred = make_credential("a");
    cred.project_id = None;
    let h = harness(lru_only(), vec![cred, make_credential("b")]);
    a_first(&h);
    *h.oauth.project_error.lock() =
        Some(CollaboratorError::Http { message: "loadCodeAssist returned 500".to_string() });

    for _ in 0..3 {
        assert_eq!(h.scheduler.select(&HashSet::new()).await.unwrap().id, "b");
    }
    assert!(!h.scheduler.credential("a").unwrap().enabled);
}

#[tokio::test]
async fn test_project_resolution_failure_with_single_credential() {
    let mut cred = make_credential("a");
    cred.project_id = None;
    let h = harness(SchedulerConfig::default(), vec![cred]);
    *h.oauth.project_error.lock() =
        Some(CollaboratorError::Rejected { message: "no project".to_string() });

    assert!(h.scheduler.select(&HashSet::new()).await.is_err());
    assert!(!h.scheduler.credential("a").unwrap().enabled);
}

#[tokio::test]
async fn test_disable_releases_sticky_and_persists() {
    let h = harness(SchedulerConfig::default(), vec![make_credential("a"), make_credential("b")]);
    let first = h.scheduler.select(&HashSet::new()).await.unwrap();

    h.scheduler.disable(&first.id, "manual").await;
    assert!(h.scheduler.sticky_session().is_none());

    let stored = h.store.snapshot();
    let persisted = stored.iter().find(|c| c.id == first.id).unwrap();
    assert!(!persisted.enabled);
    assert_eq!(persisted.disabled_reason.as_deref(), Some("manual"));

    for _ in 0..10 {
        assert_ne!(h.scheduler.select(&HashSet::new()).await.unwrap().id, first.id);
    }
}

#[tokio::test]
async fn test_outcomes_are_written_to_ledger() {
    let h = harness(SchedulerConfig::default(), vec![make_credential("a")]);
    h.scheduler.record_success("a").await;
    h.clock.advance(5);
    h.scheduler.record_failure("a", 429).await;

    let events = h.ledger.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], UsageEvent::success("a", T0));
    assert_eq!(events[1], UsageEvent::failure("a", T0 + 5, 429));
}

#[tokio::test]
async fn test_load_replays_ledger() {
    let ledger = MemoryUsageLedger::with_events(vec![
        UsageEvent::success("a", T0 - 5_000),
        UsageEvent::failure("a", T0 - 1_000, 429),
    ]);
    let h = harness_with_ledger(SchedulerConfig::default(), vec![], ledger);

    let enabled = h.scheduler.load().await.unwrap();
    assert_eq!(enabled, 0, "store was seeded empty");

    let stats = h.scheduler.runtime_stats("a");
    assert_eq!(stats.last_failure_at, Some(T0 - 1_000));
    assert_eq!(stats.success_count, 1);
    assert!(h.scheduler.in_cooldown("a"));
}
