// OpenAI SSE chunk builders
use serde_json::{json, Value};

pub const DONE_LINE: &str = "data: [DONE]\n\n";

/// Format an SSE data line
#[inline]
pub fn sse_line(data: &Value) -> String {
    format!("data: {}\n\n", serde_json::to_string(data).unwrap_or_default())
}

fn chunk(stream_id: &str, created_ts: i64, model: &str, delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": stream_id,
        "object": "chat.completion.chunk",
        "created": created_ts,
        "model": model,
        "choices": [{
            "index": 0,
            "delta": delta,
            "finish_reason": finish_reason
        }]
    })
}

pub fn content_chunk(stream_id: &str, created_ts: i64, model: &str, content: &str) -> Value {
    chunk(stream_id, created_ts, model, json!({ "role": "assistant", "content": content }), None)
}

/// Thought text goes out as `reasoning_content`.
pub fn reasoning_chunk(stream_id: &str, created_ts: i64, model: &str, reasoning_content: &str) -> Value {
    chunk(
        stream_id,
        created_ts,
        model,
        json!({ "role": "assistant", "content": Value::Null, "reasoning_content": reasoning_content }),
        None,
    )
}

pub fn tool_call_chunk(
    stream_id: &str,
    created_ts: i64,
    model: &str,
    tool_index: u32,
    call_id: &str,
    name: &str,
    arguments: &str,
) -> Value {
    chunk(
        stream_id,
        created_ts,
        model,
        json!({
            "role": "assistant",
            "tool_calls": [{
                "index": tool_index,
                "id": call_id,
                "type": "function",
                "function": { "name": name, "arguments": arguments }
            }]
        }),
        None,
    )
}

pub fn finish_chunk(stream_id: &str, created_ts: i64, model: &str, finish_reason: &str) -> Value {
    chunk(stream_id, created_ts, model, json!({}), Some(finish_reason))
}

pub fn error_chunk(
    stream_id: &str,
    created_ts: i64,
    model: &str,
    error_type: &str,
    message: &str,
) -> Value {
    json!({
        "id": stream_id,
        "object": "chat.completion.chunk",
        "created": created_ts,
        "model": model,
        "choices": [],
        "error": {
            "type": error_type,
            "message": message,
            "code": "stream_error"
        }
    })
}

pub fn usage_chunk(stream_id: &str, created_ts: i64, model: &str, usage: &impl serde::Serialize) -> Value {
    json!({
        "id": stream_id,
        "object": "chat.completion.chunk",
        "created": created_ts,
        "model": model,
        "choices": [],
        "usage": usage
    })
}
