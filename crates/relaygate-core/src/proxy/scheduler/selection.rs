use rand::Rng;
use relaygate_types::models::SchedulerConfig;
use relaygate_types::{Credential, ProxyError};
use std::collections::HashSet;

use super::selection_helpers::{selection_weight, weighted_pick};
use super::token_refresh::PrepareFailure;
use super::{CredentialScheduler, SchedulerState, StickySession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PickPath {
    Sticky,
    Weighted,
    /// Nothing eligible; least recently used enabled credential.
    Fallback,
}

impl SchedulerState {
    /// One selection step. Pure apart from `draw`, which receives the total
    /// weight and must return a value in `0..total`.
    pub(crate) fn pick(
        &mut self,
        config: &SchedulerConfig,
        now_ms: i64,
        excluded: &HashSet<String>,
        draw: impl FnOnce(u64) -> u64,
    ) -> Option<(Credential, PickPath)> {
        let active: Vec<String> = self
            .credentials
            .iter()
            .filter(|c| c.enabled && !excluded.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();
        if active.is_empty() {
            return None;
        }

        let mut eligible: Vec<String> =
            active.iter().filter(|id| self.is_eligible(id, config, now_ms)).cloned().collect();

        if eligible.is_empty() {
            let lru = active.iter().min_by(|a, b| self.compare_lru(a, b))?.clone();
            self.bump_usage(&lru, now_ms);
            let cred = self.credentials.iter().find(|c| c.id == lru)?.clone();
            return Some((cred, PickPath::Fallback));
        }

        let mut exhausted: Option<String> = None;
        if let Some(sticky) = self.sticky.clone() {
            if eligible.contains(&sticky.credential_id) {
                if sticky.uses_remaining > 0 {
                    self.sticky = Some(StickySession {
                        credential_id: sticky.credential_id.clone(),
                        uses_remaining: sticky.uses_remaining - 1,
                    });
                    self.bump_usage(&sticky.credential_id, now_ms);
                    let cred =
                        self.credentials.iter().find(|c| c.id == sticky.credential_id)?.clone();
                    return Some((cred, PickPath::Sticky));
                }
                exhausted = Some(sticky.credential_id);
            }
            self.sticky = None;
        }

        if let Some(id) = exhausted {
            if eligible.len() > 1 {
                eligible.retain(|e| *e != id);
            }
        }

        eligible.sort_by(|a, b| self.compare_lru(a, b));
        eligible.truncate(config.pool_size.max(1));

        let weights: Vec<u64> = eligible
            .iter()
            .map(|id| selection_weight(&self.stats_for(id), now_ms, config.weight_floor_ms))
            .collect();
        let total: u64 = weights.iter().fold(0u64, |acc, w| acc.saturating_add(*w));
        let chosen = eligible[weighted_pick(&weights, draw(total))].clone();

        self.sticky = Some(StickySession {
            credential_id: chosen.clone(),
            uses_remaining: config.max_sticky_usage.saturating_sub(1),
        });
        self.bump_usage(&chosen, now_ms);

        let cred = self.credentials.iter().find(|c| c.id == chosen)?.clone();
        Some((cred, PickPath::Weighted))
    }
}

impl CredentialScheduler {
    /// Pick a credential not in `exclude`, refreshing its token and resolving
    /// its project on the way out.
    ///
    /// Credentials whose project cannot be resolved (or whose refresh token
    /// was revoked) are disabled and selection is retried without them.
    pub async fn select(&self, exclude: &HashSet<String>) -> Result<Credential, ProxyError> {
        let mut excluded = exclude.clone();

        loop {
            self.refresh_usage_cache(&excluded).await;

            let now = self.clock.now_ms();
            let picked = {
                let mut state = self.state.lock();
                state.pick(&self.config, now, &excluded, |total| {
                    if total == 0 {
                        0
                    } else {
                        rand::thread_rng().gen_range(0..total)
                    }
                })
            };

            let Some((credential, path)) = picked else {
                let reason = if excluded.is_empty() {
                    "no enabled credentials".to_string()
                } else {
                    format!("all credentials excluded ({} tried)", excluded.len())
                };
                return Err(ProxyError::NoCredentialAvailable { reason });
            };

            match path {
                PickPath::Fallback => tracing::warn!(
                    "[Scheduler] No eligible credential, falling back to LRU {}",
                    credential.label()
                ),
                PickPath::Sticky => {
                    tracing::debug!("[Scheduler] Sticky hit on {}", credential.label())
                },
                PickPath::Weighted => {
                    tracing::debug!("[Scheduler] Selected {}", credential.label())
                },
            }

            let id = credential.id.clone();
            match self.prepare(credential).await {
                Ok(ready) => return Ok(ready),
                Err(PrepareFailure::Disable(reason)) => {
                    self.disable(&id, &reason).await;
                    excluded.insert(id);
                },
                Err(PrepareFailure::Skip(reason)) => {
                    tracing::warn!("[Scheduler] Skipping {} for this request: {}", id, reason);
                    self.state.lock().release_sticky_for(&id);
                    excluded.insert(id);
                },
            }
        }
    }
}
