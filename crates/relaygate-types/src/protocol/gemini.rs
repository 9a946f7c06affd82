//! v1internal generateContent envelope and response metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inner `request` object of the v1internal envelope.
///
/// Every downstream dialect is translated into this shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub contents: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Native fields forwarded untouched (safetySettings, labels, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body POSTed to `{base}:generateContent` / `{base}:streamGenerateContent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamEnvelope {
    pub project: String,
    pub request_id: String,
    pub model: String,
    pub request: GenerateRequest,
}

impl UpstreamEnvelope {
    /// Wrap a request for one credential. `source` tags the request id
    /// with the downstream dialect (`openai-`, `claude-`, `gemini-`).
    pub fn new(project: &str, model: &str, source: &str, request: GenerateRequest) -> Self {
        Self {
            project: project.to_string(),
            request_id: format!("{}-{}", source, uuid::Uuid::new_v4()),
            model: model.to_string(),
            request,
        }
    }
}

/// `usageMetadata` as reported by the upstream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamUsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub candidates_token_count: Option<u32>,
    #[serde(default)]
    pub total_token_count: Option<u32>,
    #[serde(default)]
    pub thoughts_token_count: Option<u32>,
}
