use relaygate_types::Credential;
use std::sync::Arc;

use super::CredentialScheduler;

pub(crate) enum PrepareFailure {
    /// Permanently unusable: disable and persist.
    Disable(String),
    /// Transient: exclude from this selection only.
    Skip(String),
}

impl CredentialScheduler {
    /// Make sure the credential has a live access token and a project id.
    pub(super) async fn prepare(&self, credential: Credential) -> Result<Credential, PrepareFailure> {
        let mut cred = credential;

        if cred.needs_refresh(self.clock.now_secs(), self.config.refresh_skew_secs) {
            self.try_refresh_token(&mut cred).await?;
        }

        if !cred.has_project() {
            self.ensure_project_id(&mut cred).await?;
        }

        Ok(cred)
    }

    async fn try_refresh_token(&self, cred: &mut Credential) -> Result<(), PrepareFailure> {
        // Per-credential lock so concurrent selections share one refresh
        let lock = self
            .refresh_locks
            .entry(cred.id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let now_secs = self.clock.now_secs();
        if let Some(current) = self.credential(&cred.id) {
            if !current.needs_refresh(now_secs, self.config.refresh_skew_secs) {
                cred.access_token = current.access_token;
                cred.expires_at = current.expires_at;
                cred.refresh_token = current.refresh_token;
                return Ok(());
            }
        }

        tracing::debug!("[Scheduler] Token for {} expiring, refreshing...", cred.label());

        match self.oauth.refresh(&cred.refresh_token).await {
            Ok(grant) => {
                cred.access_token = grant.access_token;
                cred.expires_at = now_secs + grant.expires_in;
                if let Some(new_refresh) = grant.refresh_token {
                    cred.refresh_token = new_refresh;
                }
                self.write_back(cred);
                self.persist().await;
                Ok(())
            },
            Err(e) if e.is_permanent() => {
                Err(PrepareFailure::Disable(format!("token refresh rejected: {}", e)))
            },
            Err(e) => Err(PrepareFailure::Skip(format!("token refresh failed: {}", e))),
        }
    }

    async fn ensure_project_id(&self, cred: &mut Credential) -> Result<(), PrepareFailure> {
        tracing::debug!("[Scheduler] {} missing project_id, resolving...", cred.label());

        match self.oauth.resolve_project_id(&cred.access_token).await {
            Ok(pid) => {
                cred.project_id = Some(pid);
                self.write_back(cred);
                self.persist().await;
                Ok(())
            },
            Err(e) => Err(PrepareFailure::Disable(format!("project resolution failed: {}", e))),
        }
    }

    /// Copy refreshed token fields and project id into the shared state.
    fn write_back(&self, cred: &Credential) {
        let mut state = self.state.lock();
        if let Some(entry) = state.find_mut(&cred.id) {
            entry.access_token = cred.access_token.clone();
            entry.expires_at = cred.expires_at;
            entry.refresh_token = cred.refresh_token.clone();
            entry.project_id = cred.project_id.clone();
        }
    }
}
