use chrono::Utc;
use relaygate_types::{FinishReason, NormalizedEvent};

use super::models::*;

/// Fold a complete event sequence into one chat completion.
pub fn build_openai_response(events: &[NormalizedEvent], model: &str) -> OpenAIResponse {
    let mut content = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();
    let mut usage = None;
    let mut finish_reason = FinishReason::Stop;

    for event in events {
        match event {
            NormalizedEvent::Text { text } => content.push_str(text),
            NormalizedEvent::Thinking { text } => reasoning.push_str(text),
            NormalizedEvent::Image(image) => content.push_str(&image.to_markdown()),
            NormalizedEvent::ToolCall(call) => tool_calls.push(OpenAIToolCall {
                id: call.id.clone(),
                r#type: "function".to_string(),
                function: ToolFunction { name: call.name.clone(), arguments: call.arguments_json() },
            }),
            NormalizedEvent::UsageMetadata(u) => usage = Some(OpenAIUsage::from(*u)),
            NormalizedEvent::Finish { reason } => finish_reason = *reason,
        }
    }

    let message = OpenAIMessage {
        role: "assistant".to_string(),
        content: (!content.is_empty() || tool_calls.is_empty()).then_some(OpenAIContent::String(content)),
        reasoning_content: (!reasoning.is_empty()).then_some(reasoning),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        ..Default::default()
    };

    OpenAIResponse {
        id: format!("chatcmpl-{}", uuid::Uuid::new_v4()),
        object: "chat.completion".to_string(),
        created: Utc::now().timestamp(),
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message,
            finish_reason: Some(finish_reason.as_openai().to_string()),
        }],
        usage,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use relaygate_types::{ImageRef, ToolCall, Usage};
    use serde_json::json;

    #[test]
    fn test_text_reasoning_and_usage() {
        let events = vec![
            NormalizedEvent::Thinking { text: "hmm".to_string() },
            NormalizedEvent::Text { text: "Hello ".to_string() },
            NormalizedEvent::Text { text: "world".to_string() },
            NormalizedEvent::Image(ImageRef {
                url: "/images/a.png".to_string(),
                mime_type: "image/png".to_string(),
            }),
            NormalizedEvent::UsageMetadata(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
                reasoning_tokens: 2,
            }),
            NormalizedEvent::Finish { reason: FinishReason::Length },
        ];

        let resp = build_openai_response(&events, "gemini-2.5-flash");
        let value = serde_json::to_value(&resp).unwrap();

        assert!(resp.id.starts_with("chatcmpl-"));
        assert_eq!(value["object"], "chat.completion");
        assert_eq!(value["choices"][0]["message"]["content"], "Hello world![image](/images/a.png)");
        assert_eq!(value["choices"][0]["message"]["reasoning_content"], "hmm");
        assert_eq!(value["choices"][0]["finish_reason"], "length");
        assert_eq!(value["usage"]["total_tokens"], 15);
        assert_eq!(value["usage"]["completion_tokens_details"]["reasoning_tokens"], 2);
    }

    #[test]
    fn test_tool_calls_without_text() {
        let events = vec![
            NormalizedEvent::ToolCall(ToolCall {
                id: "call_1".to_string(),
                name: "search".to_string(),
                args: json!({"q": "rust"}),
                signature: Some("sig".to_string()),
            }),
            NormalizedEvent::Finish { reason: FinishReason::ToolCalls },
        ];

        let value = serde_json::to_value(build_openai_response(&events, "m")).unwrap();
        let message = &value["choices"][0]["message"];

        assert!(message.get("content").is_none());
        assert_eq!(message["tool_calls"][0]["function"]["arguments"], r#"{"q":"rust"}"#);
        assert_eq!(value["choices"][0]["finish_reason"], "tool_calls");
        assert!(value.get("usage").is_none());
    }
}
