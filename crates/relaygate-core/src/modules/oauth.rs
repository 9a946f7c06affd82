//! Google OAuth token refresh and Code Assist project discovery.

use async_trait::async_trait;
use relaygate_types::models::UpstreamConfig;
use relaygate_types::CollaboratorError;
use serde::Deserialize;
use serde_json::Value;

use crate::proxy::collaborators::{OAuthClient, TokenGrant};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Errors in a token endpoint body that will never succeed on retry.
fn is_permanent_token_error(body: &str) -> bool {
    body.contains("invalid_grant") || body.contains("unauthorized_client")
}

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    token_url: String,
    base_url: String,
    client_id: String,
    client_secret: String,
    user_agent: String,
}

impl GoogleOAuthClient {
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            token_url: config.oauth_token_url.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, CollaboratorError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if !self.client_secret.is_empty() {
            params.push(("client_secret", self.client_secret.as_str()));
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CollaboratorError::Http { message: format!("Refresh request failed: {}", e) })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Refresh failed {}: {}", status, body);
            return Err(if is_permanent_token_error(&body) {
                CollaboratorError::Rejected { message }
            } else {
                CollaboratorError::Http { message }
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            CollaboratorError::Serialization { message: format!("Token parsing failed: {}", e) }
        })?;
        tracing::debug!("[OAuth] Token refreshed, expires in {}s", token.expires_in);

        Ok(TokenGrant {
            access_token: token.access_token,
            expires_in: token.expires_in,
            refresh_token: token.refresh_token,
        })
    }

    async fn resolve_project_id(&self, access_token: &str) -> Result<String, CollaboratorError> {
        let url = format!("{}:loadCodeAssist", self.base_url);
        let body = serde_json::json!({ "metadata": { "ideType": "ANTIGRAVITY" } });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorError::Http {
                message: format!("loadCodeAssist request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("loadCodeAssist returned {}: {}", status, text);
            return Err(if status.as_u16() == 401 || status.as_u16() == 403 {
                CollaboratorError::Rejected { message }
            } else {
                CollaboratorError::Http { message }
            });
        }

        let data: Value = response.json().await.map_err(|e| CollaboratorError::Serialization {
            message: format!("loadCodeAssist parse failed: {}", e),
        })?;

        match data.get("cloudaicompanionProject") {
            Some(Value::String(pid)) if !pid.is_empty() => Ok(pid.clone()),
            Some(Value::Object(obj)) => obj
                .get("id")
                .and_then(Value::as_str)
                .filter(|pid| !pid.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CollaboratorError::Rejected {
                    message: "loadCodeAssist returned a project without an id".to_string(),
                }),
            _ => Err(CollaboratorError::Rejected {
                message: "Account has no cloudaicompanionProject".to_string(),
            }),
        }
    }
}
