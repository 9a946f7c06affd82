use relaygate_types::models::{RuntimeStats, SchedulerConfig};
use std::cmp::Ordering;

use super::SchedulerState;

/// Cumulative-weight sampling. `draw` must be in `0..sum(weights)`;
/// out-of-range draws land on the last index.
pub fn weighted_pick(weights: &[u64], draw: u64) -> usize {
    let mut cumulative = 0u64;
    for (idx, weight) in weights.iter().enumerate() {
        cumulative = cumulative.saturating_add(*weight);
        if draw < cumulative {
            return idx;
        }
    }
    weights.len().saturating_sub(1)
}

/// Idle time plus a floor so a just-used credential keeps a chance.
pub(crate) fn selection_weight(stats: &RuntimeStats, now_ms: i64, floor_ms: u64) -> u64 {
    let idle = (now_ms - stats.last_used).max(0) as u64;
    idle.saturating_add(floor_ms)
}

impl SchedulerState {
    pub(crate) fn stats_for(&self, credential_id: &str) -> RuntimeStats {
        self.stats.get(credential_id).copied().unwrap_or_default()
    }

    /// Least recently used first; id breaks ties so ordering is stable.
    pub(crate) fn compare_lru(&self, a: &str, b: &str) -> Ordering {
        let la = self.stats_for(a).last_used;
        let lb = self.stats_for(b).last_used;
        la.cmp(&lb).then_with(|| a.cmp(b))
    }

    pub(crate) fn is_eligible(&self, credential_id: &str, config: &SchedulerConfig, now_ms: i64) -> bool {
        if self.stats_for(credential_id).in_cooldown(now_ms, config.cooldown_ms) {
            return false;
        }
        config.hourly_limit == 0 || self.window_count(credential_id) < config.hourly_limit
    }
}
