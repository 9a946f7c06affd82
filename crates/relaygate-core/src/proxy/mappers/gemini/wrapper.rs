// Native request → internal request
use relaygate_types::protocol::gemini::GenerateRequest;
use relaygate_types::ProxyError;
use serde_json::{json, Value};

use crate::proxy::common::clean_json_schema;
use crate::proxy::mappers::InternalRequest;
use crate::proxy::signature_cache::SignatureCache;

/// Accept a native request body almost as-is. The session id is always
/// taken from the selected credential, never from the client.
pub fn transform_gemini_request(
    body: Value,
    model: &str,
    stream: bool,
    signatures: &SignatureCache,
) -> Result<InternalRequest, ProxyError> {
    if model.trim().is_empty() {
        return Err(ProxyError::Protocol { message: "model is required".to_string() });
    }
    let Value::Object(mut inner) = body else {
        return Err(ProxyError::Protocol { message: "request body must be a JSON object".to_string() });
    };

    for key in ["model", "sessionId", "session_id", "project", "requestId"] {
        inner.remove(key);
    }

    let mut inner = Value::Object(inner);
    if !inner.get("contents").and_then(Value::as_array).is_some_and(|c| !c.is_empty()) {
        return Err(ProxyError::Protocol { message: "contents must be a non-empty array".to_string() });
    }

    if let Some(obj) = inner.get_mut("systemInstruction").and_then(Value::as_object_mut) {
        obj.entry("role").or_insert_with(|| json!("user"));
    }

    inject_signatures(&mut inner, signatures);
    clean_tool_declarations(&mut inner);

    let request: GenerateRequest = serde_json::from_value(inner)
        .map_err(|e| ProxyError::Protocol { message: format!("invalid generateContent body: {}", e) })?;

    tracing::debug!(
        "[Gemini-Wrap] model={} contents={} stream={}",
        model,
        request.contents.len(),
        stream
    );

    Ok(InternalRequest { model: model.to_string(), stream, request })
}

/// Restore cached signatures on replayed model turns that lost them.
fn inject_signatures(inner: &mut Value, signatures: &SignatureCache) {
    let Some(contents) = inner.get_mut("contents").and_then(Value::as_array_mut) else {
        return;
    };

    for content in contents.iter_mut().filter(|c| c["role"] == "model") {
        let Some(parts) = content.get_mut("parts").and_then(Value::as_array_mut) else {
            continue;
        };
        for part in parts {
            if part.get("thoughtSignature").is_some() || part["thought"] == true {
                continue;
            }
            let signature = if let Some(call) = part.get("functionCall") {
                call.get("id").and_then(Value::as_str).and_then(|id| signatures.get_tool_signature(id))
            } else if let Some(text) = part.get("text").and_then(Value::as_str) {
                signatures.lookup_text_signature(text)
            } else {
                None
            };
            if let (Some(sig), Some(obj)) = (signature, part.as_object_mut()) {
                tracing::debug!("[Gemini-Wrap] Injected signature (len: {})", sig.len());
                obj.insert("thoughtSignature".to_string(), json!(sig));
            }
        }
    }
}

fn clean_tool_declarations(inner: &mut Value) {
    let Some(tools) = inner.get_mut("tools").and_then(Value::as_array_mut) else {
        return;
    };

    for tool in tools {
        let Some(decls) = tool.get_mut("functionDeclarations").and_then(Value::as_array_mut) else {
            continue;
        };
        for decl in decls {
            let Some(decl_obj) = decl.as_object_mut() else { continue };
            // CLI-style clients send parametersJsonSchema.
            if let Some(mut params) = decl_obj.remove("parametersJsonSchema") {
                clean_json_schema(&mut params);
                decl_obj.insert("parameters".to_string(), params);
            } else if let Some(params) = decl_obj.get_mut("parameters") {
                clean_json_schema(params);
            }
        }
    }
}
