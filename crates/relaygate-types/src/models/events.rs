//! Normalized stream events produced by the upstream adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dialect-independent representation of upstream output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedEvent {
    Text { text: String },
    /// Thought-flagged text; never part of conversation replay state.
    Thinking { text: String },
    ToolCall(ToolCall),
    Image(ImageRef),
    UsageMetadata(Usage),
    Finish { reason: FinishReason },
}

/// Tool call in the downstream shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ToolCall {
    /// Arguments as a JSON string (OpenAI `function.arguments`).
    pub fn arguments_json(&self) -> String {
        serde_json::to_string(&self.args).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Persisted inline image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub mime_type: String,
}

impl ImageRef {
    pub fn to_markdown(&self) -> String {
        format!("![image]({})", self.url)
    }
}

/// Normalized token counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    #[serde(default)]
    pub reasoning_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
}

impl FinishReason {
    /// Map an upstream candidate `finishReason`.
    pub fn from_upstream(reason: &str) -> Self {
        match reason {
            "MAX_TOKENS" => Self::Length,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
                Self::ContentFilter
            },
            _ => Self::Stop,
        }
    }

    pub fn as_openai(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
            Self::ToolCalls => "tool_calls",
        }
    }

    pub fn as_claude(self) -> &'static str {
        match self {
            Self::Stop | Self::ContentFilter => "end_turn",
            Self::Length => "max_tokens",
            Self::ToolCalls => "tool_use",
        }
    }

    pub fn as_upstream(self) -> &'static str {
        match self {
            Self::Stop | Self::ToolCalls => "STOP",
            Self::Length => "MAX_TOKENS",
            Self::ContentFilter => "SAFETY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_upstream("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::from_upstream("MAX_TOKENS").as_openai(), "length");
        assert_eq!(FinishReason::from_upstream("SAFETY").as_openai(), "content_filter");
        assert_eq!(FinishReason::ToolCalls.as_claude(), "tool_use");
        assert_eq!(FinishReason::from_upstream("OTHER"), FinishReason::Stop);
    }

    #[test]
    fn test_tool_call_arguments_json() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "lookup".to_string(),
            args: serde_json::json!({"q": "rust"}),
            signature: None,
        };
        assert_eq!(call.arguments_json(), r#"{"q":"rust"}"#);
    }
}
