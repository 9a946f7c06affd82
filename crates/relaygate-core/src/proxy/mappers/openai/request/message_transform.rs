use relaygate_types::ProxyError;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::super::models::*;
use super::content_parts::transform_content_block;
use crate::proxy::signature_cache::SignatureCache;

pub struct MessageTransformContext<'a> {
    pub signatures: &'a SignatureCache,
    pub tool_id_to_name: &'a HashMap<String, String>,
}

pub fn transform_message(
    msg: &OpenAIMessage,
    ctx: &MessageTransformContext<'_>,
) -> Result<Value, ProxyError> {
    let role = match msg.role.as_str() {
        "assistant" => "model",
        "user" | "tool" | "function" => "user",
        other => {
            return Err(ProxyError::Protocol { message: format!("unsupported message role: {}", other) })
        },
    };

    let mut parts = Vec::new();
    if msg.role == "tool" || msg.role == "function" {
        parts.push(transform_tool_response(msg, ctx)?);
    } else {
        transform_content(msg, ctx, &mut parts);
        transform_tool_calls(msg, ctx, &mut parts);
    }

    Ok(json!({ "role": role, "parts": parts }))
}

fn transform_content(msg: &OpenAIMessage, ctx: &MessageTransformContext<'_>, parts: &mut Vec<Value>) {
    let Some(content) = &msg.content else { return };
    let is_assistant = msg.role == "assistant";

    match content {
        OpenAIContent::String(s) => {
            if !s.is_empty() {
                parts.push(text_part(s, is_assistant, ctx));
            }
        },
        OpenAIContent::Array(blocks) => {
            for block in blocks {
                match block {
                    OpenAIContentBlock::Text { text } if is_assistant => {
                        parts.push(text_part(text, true, ctx));
                    },
                    _ => parts.extend(transform_content_block(block)),
                }
            }
        },
    }
}

/// Replayed assistant text carries the signature it was issued with.
fn text_part(text: &str, is_assistant: bool, ctx: &MessageTransformContext<'_>) -> Value {
    let mut part = json!({ "text": text });
    if is_assistant {
        if let Some(sig) = ctx.signatures.lookup_text_signature(text) {
            tracing::debug!("[OpenAI-Request] Restored text signature (len={})", sig.len());
            part["thoughtSignature"] = json!(sig);
        }
    }
    part
}

fn transform_tool_calls(msg: &OpenAIMessage, ctx: &MessageTransformContext<'_>, parts: &mut Vec<Value>) {
    for tc in msg.tool_calls.iter().flatten() {
        let args = if tc.function.arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str::<Value>(&tc.function.arguments).unwrap_or_else(|e| {
                tracing::warn!(
                    "[OpenAI-Request] Malformed arguments for tool call {}: {}",
                    tc.id,
                    e
                );
                json!({})
            })
        };

        let mut part = json!({
            "functionCall": { "name": &tc.function.name, "args": args, "id": &tc.id }
        });
        match ctx.signatures.get_tool_signature(&tc.id) {
            Some(sig) => part["thoughtSignature"] = json!(sig),
            None => tracing::debug!("[OpenAI-Request] No signature cached for tool call {}", tc.id),
        }
        parts.push(part);
    }
}

fn transform_tool_response(
    msg: &OpenAIMessage,
    ctx: &MessageTransformContext<'_>,
) -> Result<Value, ProxyError> {
    let call_id = msg.tool_call_id.clone().unwrap_or_default();
    let name = ctx
        .tool_id_to_name
        .get(&call_id)
        .cloned()
        .or_else(|| msg.name.clone())
        .ok_or_else(|| ProxyError::Protocol {
            message: format!("tool result '{}' does not match any assistant tool call", call_id),
        })?;

    let result = msg.content.as_ref().map(OpenAIContent::text).unwrap_or_default();
    Ok(json!({
        "functionResponse": {
            "name": name,
            "response": { "result": result },
            "id": call_id
        }
    }))
}

/// Upstream rejects consecutive turns with the same role.
pub fn merge_consecutive_roles(contents: Vec<Value>) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::new();
    for msg in contents {
        if let Some(last) = merged.last_mut() {
            if last["role"] == msg["role"] {
                if let (Some(last_parts), Some(msg_parts)) =
                    (last["parts"].as_array_mut(), msg["parts"].as_array())
                {
                    last_parts.extend(msg_parts.iter().cloned());
                    continue;
                }
            }
        }
        merged.push(msg);
    }
    merged
}
