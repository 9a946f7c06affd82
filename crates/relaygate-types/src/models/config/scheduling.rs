//! Credential scheduling and retry configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Selection policy knobs for the credential scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SchedulerConfig {
    /// Cooldown after a rate-limit failure
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: i64,
    /// Max calls per credential in a sliding hour (0 = unlimited)
    #[serde(default)]
    pub hourly_limit: u32,
    /// Consecutive selections served by the sticky credential
    #[validate(range(min = 1_u32))]
    #[serde(default = "default_max_sticky_usage")]
    pub max_sticky_usage: u32,
    /// Top-K least recently used candidates for the weighted pick
    #[validate(range(min = 1_usize))]
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Weight floor so a just-used credential keeps a non-zero chance
    #[validate(range(min = 1_u64))]
    #[serde(default = "default_weight_floor_ms")]
    pub weight_floor_ms: u64,
    /// How long an hourly usage count is trusted before re-querying the ledger
    #[serde(default = "default_usage_cache_ttl_ms")]
    pub usage_cache_ttl_ms: i64,
    /// Refresh access tokens this many seconds before expiry
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            hourly_limit: 0,
            max_sticky_usage: default_max_sticky_usage(),
            pool_size: default_pool_size(),
            weight_floor_ms: default_weight_floor_ms(),
            usage_cache_ttl_ms: default_usage_cache_ttl_ms(),
            refresh_skew_secs: default_refresh_skew_secs(),
        }
    }
}

/// Retry and credential-switch policy for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct RetryConfig {
    /// Credential attempts per client request
    #[validate(range(min = 1_u32, max = 20_u32))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Statuses that exclude the credential and switch to another
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Fraction of the delay applied as +/- jitter
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
    /// Switch credentials after an auth failure instead of aborting
    #[serde(default)]
    pub switch_on_auth_error: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retryable_statuses: default_retryable_statuses(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter_ratio: default_jitter_ratio(),
            switch_on_auth_error: false,
        }
    }
}

impl RetryConfig {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

pub const fn default_cooldown_ms() -> i64 {
    60_000
}

const fn default_max_sticky_usage() -> u32 {
    5
}

const fn default_pool_size() -> usize {
    3
}

const fn default_weight_floor_ms() -> u64 {
    1_000
}

const fn default_usage_cache_ttl_ms() -> i64 {
    10_000
}

const fn default_refresh_skew_secs() -> i64 {
    300
}

const fn default_max_attempts() -> u32 {
    3
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![500]
}

const fn default_base_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

const fn default_jitter_ratio() -> f64 {
    0.2
}
