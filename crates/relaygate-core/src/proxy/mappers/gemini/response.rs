// Normalized events → native generateContent responses
use bytes::Bytes;
use futures::StreamExt;
use relaygate_types::{FinishReason, NormalizedEvent, ProxyError, ToolCall, Usage};
use serde_json::{json, Value};

use crate::proxy::mappers::SseStream;
use crate::proxy::upstream::EventStream;

fn usage_metadata(usage: &Usage) -> Value {
    let mut meta = json!({
        "promptTokenCount": usage.prompt_tokens,
        "candidatesTokenCount": usage.completion_tokens,
        "totalTokenCount": usage.total_tokens,
    });
    if usage.reasoning_tokens > 0 {
        meta["thoughtsTokenCount"] = json!(usage.reasoning_tokens);
    }
    meta
}

fn function_call_part(call: &ToolCall) -> Value {
    let mut part = json!({ "functionCall": { "name": call.name, "args": call.args, "id": call.id } });
    if let Some(sig) = &call.signature {
        part["thoughtSignature"] = json!(sig);
    }
    part
}

fn event_part(event: &NormalizedEvent) -> Option<Value> {
    match event {
        NormalizedEvent::Text { text } => Some(json!({ "text": text })),
        NormalizedEvent::Thinking { text } => Some(json!({ "text": text, "thought": true })),
        NormalizedEvent::Image(image) => Some(json!({ "text": image.to_markdown() })),
        NormalizedEvent::ToolCall(call) => Some(function_call_part(call)),
        NormalizedEvent::UsageMetadata(_) | NormalizedEvent::Finish { .. } => None,
    }
}

fn candidate_document(parts: Vec<Value>, finish: Option<FinishReason>, usage: Option<&Usage>, model: &str) -> Value {
    let mut candidate = json!({ "content": { "role": "model", "parts": parts }, "index": 0 });
    if let Some(reason) = finish {
        candidate["finishReason"] = json!(reason.as_upstream());
    }
    let mut doc = json!({ "candidates": [candidate], "modelVersion": model });
    if let Some(usage) = usage {
        doc["usageMetadata"] = usage_metadata(usage);
    }
    doc
}

/// One complete response document; adjacent text parts are merged.
pub fn build_gemini_response(events: &[NormalizedEvent], model: &str) -> Value {
    let mut parts: Vec<Value> = Vec::new();
    let mut usage = None;
    let mut finish = None;

    for event in events {
        match event {
            NormalizedEvent::UsageMetadata(u) => usage = Some(*u),
            NormalizedEvent::Finish { reason } => finish = Some(*reason),
            NormalizedEvent::Text { text } => {
                let merged = parts.last_mut().and_then(|last| {
                    let is_plain = last.get("thought").is_none() && last.get("functionCall").is_none();
                    let existing = last.get("text").and_then(Value::as_str).filter(|_| is_plain)?;
                    *last = json!({ "text": format!("{}{}", existing, text) });
                    Some(())
                });
                if merged.is_none() {
                    parts.push(json!({ "text": text }));
                }
            },
            other => parts.extend(event_part(other)),
        }
    }

    candidate_document(parts, Some(finish.unwrap_or(FinishReason::Stop)), usage.as_ref(), model)
}

/// Google RPC status name for an HTTP status.
fn rpc_status(status: u16) -> &'static str {
    match status {
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        429 => "RESOURCE_EXHAUSTED",
        503 => "UNAVAILABLE",
        504 => "DEADLINE_EXCEEDED",
        _ => "INTERNAL",
    }
}

/// Native error envelope, used both in-band and as an HTTP body.
pub fn error_document(err: &ProxyError) -> Value {
    let code = err.http_status_code();
    json!({
        "error": {
            "code": code,
            "message": err.to_string(),
            "status": rpc_status(code),
            "type": err.kind()
        }
    })
}

/// One `data:` frame per event; usage rides on the final finish frame.
pub fn create_gemini_sse_stream(mut events: EventStream, model: String) -> SseStream {
    let stream = async_stream::stream! {
        let mut usage: Option<Usage> = None;

        while let Some(item) = events.next().await {
            let doc = match item {
                Ok(NormalizedEvent::UsageMetadata(u)) => {
                    usage = Some(u);
                    continue;
                },
                Ok(NormalizedEvent::Finish { reason }) => {
                    candidate_document(Vec::new(), Some(reason), usage.as_ref(), &model)
                },
                Ok(event) => match event_part(&event) {
                    Some(part) => candidate_document(vec![part], None, None, &model),
                    None => continue,
                },
                Err(e) => {
                    tracing::error!("[Gemini-SSE] Stream interrupted: {}", e);
                    yield Bytes::from(format!("data: {}\n\n", error_document(&e)));
                    break;
                },
            };
            yield Bytes::from(format!("data: {}\n\n", doc));
        }
    };

    Box::pin(stream)
}
