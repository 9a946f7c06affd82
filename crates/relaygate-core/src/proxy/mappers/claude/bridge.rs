//! Bridge converter: Claude Messages request → OpenAI chat completion request.
//!
//! Claude requests reuse the OpenAI request pipeline, so only the envelope
//! is remapped here: system prompt, content blocks, tool_use / tool_result
//! pairs, tool definitions and sampling parameters.

use relaygate_types::ProxyError;
use serde_json::{json, Value};

use super::models::*;
use crate::proxy::mappers::openai::{
    OpenAIContent, OpenAIContentBlock, OpenAIImageUrl, OpenAIMessage, OpenAIRequest,
    OpenAIToolCall, ToolFunction,
};

pub fn claude_to_openai_request(req: &ClaudeRequest) -> Result<OpenAIRequest, ProxyError> {
    let mut messages: Vec<OpenAIMessage> = Vec::new();

    if let Some(system) = &req.system {
        let text = system.text();
        if !text.is_empty() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(OpenAIContent::String(text)),
                ..Default::default()
            });
        }
    }

    for msg in &req.messages {
        match msg.role.as_str() {
            "user" => convert_user_message(&msg.content, &mut messages),
            "assistant" => messages.push(convert_assistant_message(&msg.content)),
            other => {
                return Err(ProxyError::Protocol {
                    message: format!("unsupported message role: {}", other),
                })
            },
        }
    }

    let tools = req.tools.as_ref().map(|tools| tools.iter().map(convert_tool).collect());
    let tool_choice = req.tool_choice.as_ref().and_then(convert_tool_choice);

    Ok(OpenAIRequest {
        model: req.model.clone(),
        messages,
        stream: req.stream,
        max_tokens: req.max_tokens,
        temperature: req.temperature,
        top_p: req.top_p,
        top_k: req.top_k,
        stop: req.stop_sequences.as_ref().filter(|s| !s.is_empty()).map(|s| json!(s)),
        tools,
        tool_choice,
        thinking_budget: req.thinking.as_ref().and_then(ThinkingConfig::budget),
        ..Default::default()
    })
}

/// Tool results become `tool` messages ahead of any remaining user content,
/// since they answer the preceding assistant turn.
fn convert_user_message(content: &MessageContent, out: &mut Vec<OpenAIMessage>) {
    let blocks = match content {
        MessageContent::String(s) => {
            out.push(user_message(OpenAIContent::String(s.clone())));
            return;
        },
        MessageContent::Array(blocks) => blocks,
    };

    let mut parts: Vec<OpenAIContentBlock> = Vec::new();
    for block in blocks {
        match block {
            ContentBlock::ToolResult { tool_use_id, content, is_error } => {
                let mut text = tool_result_text(content);
                if is_error.unwrap_or(false) {
                    text = format!("Error: {}", text);
                }
                out.push(OpenAIMessage {
                    role: "tool".to_string(),
                    content: Some(OpenAIContent::String(text)),
                    tool_call_id: Some(tool_use_id.clone()),
                    ..Default::default()
                });
            },
            ContentBlock::Text { text } => parts.push(OpenAIContentBlock::Text { text: text.clone() }),
            ContentBlock::Image { source } => match image_url(source) {
                Some(url) => parts.push(OpenAIContentBlock::ImageUrl {
                    image_url: OpenAIImageUrl { url, detail: None },
                }),
                None => tracing::warn!("[Claude-Bridge] Skipping image with unsupported source"),
            },
            ContentBlock::Thinking { .. }
            | ContentBlock::RedactedThinking { .. }
            | ContentBlock::ToolUse { .. } => {
                tracing::debug!("[Claude-Bridge] Dropping assistant-only block in user message");
            },
        }
    }

    match parts.as_slice() {
        [] => {},
        [OpenAIContentBlock::Text { text }] => {
            out.push(user_message(OpenAIContent::String(text.clone())));
        },
        _ => out.push(user_message(OpenAIContent::Array(parts))),
    }
}

fn user_message(content: OpenAIContent) -> OpenAIMessage {
    OpenAIMessage { role: "user".to_string(), content: Some(content), ..Default::default() }
}

fn convert_assistant_message(content: &MessageContent) -> OpenAIMessage {
    let mut text = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();

    match content {
        MessageContent::String(s) => text.push_str(s),
        MessageContent::Array(blocks) => {
            for block in blocks {
                match block {
                    ContentBlock::Text { text: t } => text.push_str(t),
                    ContentBlock::Thinking { thinking, .. } => reasoning.push_str(thinking),
                    ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                        id: id.clone(),
                        r#type: "function".to_string(),
                        function: ToolFunction {
                            name: name.clone(),
                            arguments: serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string()),
                        },
                    }),
                    _ => {},
                }
            }
        },
    }

    OpenAIMessage {
        role: "assistant".to_string(),
        content: (!text.is_empty()).then_some(OpenAIContent::String(text)),
        reasoning_content: (!reasoning.is_empty()).then_some(reasoning),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        ..Default::default()
    }
}

fn tool_result_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn image_url(source: &ImageSource) -> Option<String> {
    match source.source_type.as_str() {
        "base64" => {
            let data = source.data.as_deref()?;
            let mime = source.media_type.as_deref().unwrap_or("image/png");
            Some(format!("data:{};base64,{}", mime, data))
        },
        "url" => source.url.clone(),
        _ => None,
    }
}

fn convert_tool(tool: &Tool) -> Value {
    let mut function = json!({ "name": tool.name });
    if let Some(desc) = &tool.description {
        function["description"] = json!(desc);
    }
    if let Some(schema) = &tool.input_schema {
        function["parameters"] = schema.clone();
    }
    json!({ "type": "function", "function": function })
}

fn convert_tool_choice(choice: &Value) -> Option<Value> {
    match choice.get("type").and_then(Value::as_str)? {
        "auto" => Some(json!("auto")),
        "any" => Some(json!("required")),
        "none" => Some(json!("none")),
        "tool" => {
            let name = choice.get("name").and_then(Value::as_str)?;
            Some(json!({ "type": "function", "function": { "name": name } }))
        },
        _ => None,
    }
}
