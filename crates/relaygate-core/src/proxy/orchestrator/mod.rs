//! Request orchestration: select, dispatch, classify, retry or switch.
//!
//! ```text
//! SELECT ─▶ DISPATCH ─┬─▶ SUCCESS
//!    ▲                ├─▶ 429 (first)  ─▶ wait, DISPATCH same credential
//!    └──── exclude ◀──┼─▶ 429 (second) / retryable / transport
//!                     └─▶ auth (disable) / fatal ─▶ error
//! ```

mod outcome;
mod retry_strategy;


pub use outcome::{classify, Outcome, UpstreamFailure};
pub use retry_strategy::{
    apply_retry_strategy, backoff_delay_ms, determine_retry_strategy, RetryStrategy,
};

use relaygate_types::models::RetryConfig;
use relaygate_types::{Credential, ProxyError};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::proxy::common::generate_random_id;
use crate::proxy::scheduler::CredentialScheduler;

/// Per-request attempt bookkeeping; discarded when the request completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptRecord {
    pub credential_id: String,
    /// Credential attempts consumed (same-credential 429 retries excluded).
    pub attempt_number: u32,
    pub token_switches: u32,
    pub same_credential_retries: u32,
    pub started_at_ms: i64,
}

/// Successful dispatch result with the credential that served it.
#[derive(Debug)]
pub struct Dispatched<T> {
    pub value: T,
    pub credential: Credential,
    pub record: AttemptRecord,
}

pub struct RequestOrchestrator {
    scheduler: Arc<CredentialScheduler>,
    config: RetryConfig,
}

impl RequestOrchestrator {
    pub fn new(scheduler: Arc<CredentialScheduler>, config: RetryConfig) -> Self {
        Self { scheduler, config }
    }

    pub fn scheduler(&self) -> &Arc<CredentialScheduler> {
        &self.scheduler
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Drive one client request to completion. `dispatch` performs a single
    /// upstream call with the given credential.
    pub async fn execute<T, F, Fut>(&self, mut dispatch: F) -> Result<Dispatched<T>, ProxyError>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = Result<T, UpstreamFailure>>,
    {
        let trace_id = generate_random_id();
        let mut excluded: HashSet<String> = HashSet::new();
        let mut record = AttemptRecord { started_at_ms: self.scheduler.now_ms(), ..Default::default() };
        let mut last_failure: Option<UpstreamFailure> = None;

        while record.attempt_number < self.config.max_attempts {
            let credential = match self.scheduler.select(&excluded).await {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("[{}] [Orchestrator] selection failed: {}", trace_id, e);
                    return Err(last_failure.map_or(e, UpstreamFailure::into_error));
                },
            };

            record.attempt_number += 1;
            if !record.credential_id.is_empty() && record.credential_id != credential.id {
                record.token_switches += 1;
            }
            record.credential_id = credential.id.clone();
            tracing::debug!(
                "[{}] [Orchestrator] attempt {}/{} with {}",
                trace_id,
                record.attempt_number,
                self.config.max_attempts,
                credential.label()
            );

            let mut rate_limited_before = false;
            loop {
                let failure = match dispatch(credential.clone()).await {
                    Ok(value) => {
                        self.scheduler.record_success(&credential.id).await;
                        if record.token_switches > 0 || record.same_credential_retries > 0 {
                            tracing::info!(
                                "[{}] [Orchestrator] succeeded on {} after {} switch(es), {} same-credential retr(ies)",
                                trace_id,
                                credential.id,
                                record.token_switches,
                                record.same_credential_retries
                            );
                        }
                        return Ok(Dispatched { value, credential, record });
                    },
                    Err(failure) => failure,
                };

                match classify(&failure, rate_limited_before, &self.config) {
                    Outcome::Disable => {
                        let reason = format!("auth failure {}: {}", failure.status, failure.message);
                        self.scheduler.disable(&credential.id, &reason).await;
                        if !self.config.switch_on_auth_error {
                            return Err(failure.into_error());
                        }
                        excluded.insert(credential.id.clone());
                        last_failure = Some(failure);
                        break;
                    },
                    Outcome::RetrySame => {
                        self.scheduler.record_failure(&credential.id, failure.status).await;
                        let strategy = determine_retry_strategy(
                            failure.status,
                            failure.retry_after,
                            &self.config,
                        );
                        apply_retry_strategy(
                            strategy,
                            record.same_credential_retries,
                            failure.status,
                            &trace_id,
                        )
                        .await;
                        record.same_credential_retries += 1;
                        rate_limited_before = true;
                    },
                    Outcome::Switch => {
                        self.scheduler.record_failure(&credential.id, failure.status).await;
                        tracing::warn!(
                            "[{}] [Orchestrator] excluding {} after status {}",
                            trace_id,
                            credential.id,
                            failure.status
                        );
                        excluded.insert(credential.id.clone());
                        last_failure = Some(failure);
                        break;
                    },
                    Outcome::Fatal => {
                        self.scheduler.record_failure(&credential.id, failure.status).await;
                        return Err(failure.into_error());
                    },
                }
            }
        }

        tracing::warn!(
            "[{}] [Orchestrator] attempts exhausted ({}), {} credential(s) excluded",
            trace_id,
            record.attempt_number,
            excluded.len()
        );
        Err(last_failure.map_or_else(
            || ProxyError::NoCredentialAvailable { reason: "max attempts reached".to_string() },
            UpstreamFailure::into_error,
        ))
    }
}
