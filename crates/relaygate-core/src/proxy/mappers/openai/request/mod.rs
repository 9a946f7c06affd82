mod content_parts;
mod generation_config;
mod message_transform;
mod tool_declarations;


pub use tool_declarations::{transform_tool_choice, transform_tool_declarations};

use relaygate_types::protocol::gemini::GenerateRequest;
use relaygate_types::ProxyError;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::models::*;
use crate::proxy::mappers::InternalRequest;
use crate::proxy::signature_cache::SignatureCache;
use generation_config::build_generation_config;
use message_transform::{merge_consecutive_roles, transform_message, MessageTransformContext};

fn protocol_error(message: impl Into<String>) -> ProxyError {
    ProxyError::Protocol { message: message.into() }
}

/// Translate a chat completion request into the internal request.
pub fn transform_openai_request(
    request: &OpenAIRequest,
    signatures: &SignatureCache,
) -> Result<InternalRequest, ProxyError> {
    if request.model.trim().is_empty() {
        return Err(protocol_error("model is required"));
    }
    if request.messages.is_empty() {
        return Err(protocol_error("messages must not be empty"));
    }

    let system_texts: Vec<String> = request
        .messages
        .iter()
        .filter(|msg| msg.role == "system" || msg.role == "developer")
        .filter_map(|msg| msg.content.as_ref().map(OpenAIContent::text))
        .filter(|text| !text.is_empty())
        .collect();

    // Later assistant messages overwrite earlier ones, so a tool result
    // resolves against the most recent call with that id.
    let mut tool_id_to_name: HashMap<String, String> = HashMap::new();
    for msg in request.messages.iter().filter(|m| m.role == "assistant") {
        for call in msg.tool_calls.iter().flatten() {
            tool_id_to_name.insert(call.id.clone(), call.function.name.clone());
        }
    }

    let ctx = MessageTransformContext { signatures, tool_id_to_name: &tool_id_to_name };
    let mut contents = Vec::with_capacity(request.messages.len());
    for msg in request.messages.iter().filter(|m| m.role != "system" && m.role != "developer") {
        let content = transform_message(msg, &ctx)?;
        if content["parts"].as_array().is_some_and(|parts| !parts.is_empty()) {
            contents.push(content);
        }
    }
    let contents = merge_consecutive_roles(contents);
    if contents.is_empty() {
        return Err(protocol_error("request contains no user or assistant content"));
    }

    let system_instruction = (!system_texts.is_empty()).then(|| {
        let parts: Vec<Value> = system_texts.into_iter().map(|text| json!({ "text": text })).collect();
        json!({ "role": "user", "parts": parts })
    });

    let tools = request
        .tools
        .as_deref()
        .map(transform_tool_declarations)
        .filter(|decls| !decls.is_empty())
        .map(|decls| vec![json!({ "functionDeclarations": decls })]);
    let tool_config = request.tool_choice.as_ref().and_then(transform_tool_choice);

    tracing::debug!(
        "[OpenAI-Request] model={} messages={} contents={} tools={}",
        request.model,
        request.messages.len(),
        contents.len(),
        tools.as_ref().map_or(0, Vec::len)
    );

    Ok(InternalRequest {
        model: request.model.clone(),
        stream: request.stream,
        request: GenerateRequest {
            contents,
            system_instruction,
            tools,
            tool_config,
            generation_config: build_generation_config(request),
            session_id: None,
            extra: serde_json::Map::new(),
        },
    })
}
