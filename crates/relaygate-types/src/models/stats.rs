//! Per-credential runtime statistics and the usage ledger record.

use serde::{Deserialize, Serialize};

/// In-memory runtime stats for one credential. Rebuilt from the usage
/// ledger at startup and never persisted directly.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Unix millis of the last dispatch outcome, 0 if never used.
    pub last_used: i64,
    /// Unix millis of the last rate-limit failure.
    pub last_failure_at: Option<i64>,
    pub consecutive_failures: u32,
    pub success_count: u64,
}

impl RuntimeStats {
    /// Cooldown end, `lastFailureAt + cooldown_ms`.
    pub fn cooldown_until(&self, cooldown_ms: i64) -> Option<i64> {
        self.last_failure_at.map(|at| at + cooldown_ms)
    }

    /// A credential stays in cooldown up to and including the end instant.
    pub fn in_cooldown(&self, now_ms: i64, cooldown_ms: i64) -> bool {
        self.cooldown_until(cooldown_ms).is_some_and(|end| now_ms <= end)
    }

    pub fn record_success(&mut self, now_ms: i64) {
        self.consecutive_failures = 0;
        self.success_count += 1;
        self.last_used = now_ms;
    }

    pub fn record_failure(&mut self, now_ms: i64, rate_limited: bool) {
        self.consecutive_failures += 1;
        self.last_used = now_ms;
        if rate_limited {
            self.last_failure_at = Some(now_ms);
        }
    }

    /// Fold one ledger event into the stats (used on replay).
    pub fn apply(&mut self, event: &UsageEvent) {
        if event.success {
            self.record_success(event.timestamp_ms);
        } else {
            self.record_failure(event.timestamp_ms, event.is_rate_limited());
        }
    }
}

/// One dispatch outcome as recorded in the usage ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageEvent {
    pub credential_id: String,
    pub timestamp_ms: i64,
    pub status: u16,
    pub success: bool,
}

impl UsageEvent {
    pub fn success(credential_id: &str, timestamp_ms: i64) -> Self {
        Self { credential_id: credential_id.to_string(), timestamp_ms, status: 200, success: true }
    }

    pub fn failure(credential_id: &str, timestamp_ms: i64, status: u16) -> Self {
        Self { credential_id: credential_id.to_string(), timestamp_ms, status, success: false }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}
