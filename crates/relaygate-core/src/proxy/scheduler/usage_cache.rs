//! Short-lived memo of per-credential hourly call counts.

use std::collections::HashSet;

use super::{CredentialScheduler, SchedulerState};

/// Sliding window used for the hourly cap.
pub const HOUR_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageCacheEntry {
    pub window_count: u32,
    pub cached_at: i64,
}

impl UsageCacheEntry {
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.cached_at < ttl_ms
    }
}

impl SchedulerState {
    pub(crate) fn window_count(&self, credential_id: &str) -> u32 {
        self.usage_cache.get(credential_id).map_or(0, |e| e.window_count)
    }

    /// Optimistic pre-increment so bursts cannot overrun the cap before the
    /// ledger catches up.
    pub(crate) fn bump_usage(&mut self, credential_id: &str, now_ms: i64) {
        self.usage_cache
            .entry(credential_id.to_string())
            .or_insert(UsageCacheEntry { window_count: 0, cached_at: now_ms })
            .window_count += 1;
    }
}

impl CredentialScheduler {
    /// Re-query the ledger for stale cache entries of selectable credentials.
    ///
    /// Ledger counts replace the cached value; they are never added to it.
    /// An entry touched by a concurrent selection while the ledger was being
    /// read keeps the larger of the two counts.
    pub(crate) async fn refresh_usage_cache(&self, excluded: &HashSet<String>) {
        if self.config.hourly_limit == 0 {
            return;
        }

        let now = self.clock.now_ms();
        let ttl = self.config.usage_cache_ttl_ms;
        let stale: Vec<(String, Option<UsageCacheEntry>)> = {
            let state = self.state.lock();
            state
                .credentials
                .iter()
                .filter(|c| c.enabled && !excluded.contains(&c.id))
                .filter(|c| !state.usage_cache.get(&c.id).is_some_and(|e| e.is_fresh(now, ttl)))
                .map(|c| (c.id.clone(), state.usage_cache.get(&c.id).copied()))
                .collect()
        };
        if stale.is_empty() {
            return;
        }

        let since = now - HOUR_MS;
        let mut counts = Vec::with_capacity(stale.len());
        for (id, seen) in stale {
            match self.ledger.count_since(&id, since).await {
                Ok(count) => counts.push((id, seen, count)),
                Err(e) => {
                    tracing::warn!("[Scheduler] Usage count for {} unavailable: {}", id, e);
                },
            }
        }

        let mut state = self.state.lock();
        for (id, seen, count) in counts {
            let current = state.usage_cache.get(&id).copied();
            let window_count = match current {
                Some(entry) if current != seen => count.max(entry.window_count),
                _ => count,
            };
            state.usage_cache.insert(id, UsageCacheEntry { window_count, cached_at: now });
        }
    }
}
