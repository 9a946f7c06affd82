use relaygate_types::models::RetryConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    NoRetry,
    /// Upstream-provided delay, capped at the configured maximum.
    FixedDelay(Duration),
    ExponentialBackoff { base_ms: u64, max_ms: u64, jitter_ratio: f64 },
}

/// Delay before retrying a rate-limited credential.
pub fn determine_retry_strategy(
    status_code: u16,
    retry_after: Option<Duration>,
    config: &RetryConfig,
) -> RetryStrategy {
    match status_code {
        429 => match retry_after {
            Some(delay) => {
                RetryStrategy::FixedDelay(delay.min(Duration::from_millis(config.max_backoff_ms)))
            },
            None => RetryStrategy::ExponentialBackoff {
                base_ms: config.base_backoff_ms,
                max_ms: config.max_backoff_ms,
                jitter_ratio: config.jitter_ratio,
            },
        },
        _ => RetryStrategy::NoRetry,
    }
}

/// Exponential delay for `attempt` (0-based) with symmetric jitter,
/// never exceeding `max_ms`.
pub fn backoff_delay_ms(base_ms: u64, max_ms: u64, jitter_ratio: f64, attempt: u32) -> u64 {
    let calculated = base_ms.saturating_mul(2_u64.saturating_pow(attempt)).min(max_ms);
    let jitter_range = calculated as f64 * jitter_ratio;
    let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
    let jittered = (calculated as f64 + jitter).max(0.0) as u64;
    jittered.min(max_ms)
}

pub fn strategy_delay(strategy: &RetryStrategy, attempt: u32) -> Option<Duration> {
    match strategy {
        RetryStrategy::NoRetry => None,
        RetryStrategy::FixedDelay(duration) => Some(*duration),
        RetryStrategy::ExponentialBackoff { base_ms, max_ms, jitter_ratio } => Some(
            Duration::from_millis(backoff_delay_ms(*base_ms, *max_ms, *jitter_ratio, attempt)),
        ),
    }
}

/// Sleep according to `strategy`. Returns false when no retry applies.
pub async fn apply_retry_strategy(
    strategy: RetryStrategy,
    attempt: u32,
    status_code: u16,
    trace_id: &str,
) -> bool {
    let Some(delay) = strategy_delay(&strategy, attempt) else {
        debug!("[{}] Non-retryable error {}, stopping", trace_id, status_code);
        return false;
    };
    info!(
        "[{}] Retry same credential: status={}, strategy={:?}, delay={}ms",
        trace_id,
        status_code,
        strategy,
        delay.as_millis()
    );
    sleep(delay).await;
    true
}
