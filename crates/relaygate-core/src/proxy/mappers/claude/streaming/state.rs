use bytes::Bytes;
use relaygate_types::FinishReason;
use serde_json::{json, Value};

use crate::proxy::mappers::claude::models::ClaudeUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    None,
    Text,
    Thinking,
    Function,
}

/// Content-block bookkeeping for one Messages SSE response.
pub struct StreamingState {
    block_type: BlockType,
    pub block_index: usize,
    pub message_start_sent: bool,
    pub message_stop_sent: bool,
    used_tool: bool,
    pub usage: ClaudeUsage,
    pub finish_reason: Option<FinishReason>,
    message_id: String,
    model: String,
}

impl StreamingState {
    pub fn new(model: &str) -> Self {
        Self {
            block_type: BlockType::None,
            block_index: 0,
            message_start_sent: false,
            message_stop_sent: false,
            used_tool: false,
            usage: ClaudeUsage::default(),
            finish_reason: None,
            message_id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            model: model.to_string(),
        }
    }

    pub fn emit(&self, event_type: &str, data: Value) -> Bytes {
        let sse = format!(
            "event: {}\ndata: {}\n\n",
            event_type,
            serde_json::to_string(&data).unwrap_or_default()
        );
        Bytes::from(sse)
    }

    pub fn emit_message_start(&mut self) -> Option<Bytes> {
        if self.message_start_sent {
            return None;
        }
        self.message_start_sent = true;
        Some(self.emit(
            "message_start",
            json!({
                "type": "message_start",
                "message": {
                    "id": self.message_id,
                    "type": "message",
                    "role": "assistant",
                    "content": [],
                    "model": self.model,
                    "stop_reason": null,
                    "stop_sequence": null,
                    "usage": ClaudeUsage::default(),
                }
            }),
        ))
    }

    pub fn start_block(&mut self, block_type: BlockType, content_block: Value) -> Vec<Bytes> {
        let mut chunks = self.end_block();
        chunks.push(self.emit(
            "content_block_start",
            json!({
                "type": "content_block_start",
                "index": self.block_index,
                "content_block": content_block
            }),
        ));
        self.block_type = block_type;
        chunks
    }

    pub fn end_block(&mut self) -> Vec<Bytes> {
        if self.block_type == BlockType::None {
            return vec![];
        }

        let mut chunks = Vec::new();
        // Thought signatures stay upstream; clients still expect the field.
        if self.block_type == BlockType::Thinking {
            chunks.push(self.emit_delta("signature_delta", json!({ "signature": "" })));
        }
        chunks.push(self.emit(
            "content_block_stop",
            json!({ "type": "content_block_stop", "index": self.block_index }),
        ));
        self.block_index += 1;
        self.block_type = BlockType::None;
        chunks
    }

    pub fn emit_delta(&self, delta_type: &str, delta_content: Value) -> Bytes {
        let mut delta = json!({ "type": delta_type });
        if let Value::Object(map) = delta_content {
            for (k, v) in map {
                delta[k] = v;
            }
        }
        self.emit(
            "content_block_delta",
            json!({ "type": "content_block_delta", "index": self.block_index, "delta": delta }),
        )
    }

    /// Append text to the current block, opening one of `block_type` first
    /// when the stream switches kinds.
    pub fn append(&mut self, block_type: BlockType, text: &str) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        if self.block_type != block_type {
            let block = match block_type {
                BlockType::Thinking => json!({ "type": "thinking", "thinking": "", "signature": "" }),
                _ => json!({ "type": "text", "text": "" }),
            };
            chunks.extend(self.start_block(block_type, block));
        }
        chunks.push(match block_type {
            BlockType::Thinking => self.emit_delta("thinking_delta", json!({ "thinking": text })),
            _ => self.emit_delta("text_delta", json!({ "text": text })),
        });
        chunks
    }

    /// Tool calls arrive whole: one start / input_json_delta / stop triple.
    pub fn emit_tool_use(&mut self, id: &str, name: &str, arguments: &str) -> Vec<Bytes> {
        self.used_tool = true;
        let mut chunks = self.start_block(
            BlockType::Function,
            json!({ "type": "tool_use", "id": id, "name": name, "input": {} }),
        );
        chunks.push(self.emit_delta("input_json_delta", json!({ "partial_json": arguments })));
        chunks.extend(self.end_block());
        chunks
    }

    pub fn emit_finish(&mut self) -> Vec<Bytes> {
        let mut chunks = self.end_block();
        if self.message_stop_sent {
            return chunks;
        }

        let stop_reason = if self.used_tool {
            FinishReason::ToolCalls
        } else {
            self.finish_reason.unwrap_or(FinishReason::Stop)
        };
        chunks.push(self.emit(
            "message_delta",
            json!({
                "type": "message_delta",
                "delta": { "stop_reason": stop_reason.as_claude(), "stop_sequence": null },
                "usage": self.usage
            }),
        ));
        chunks.push(Bytes::from_static(b"event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n"));
        self.message_stop_sent = true;
        chunks
    }

    pub fn emit_error(&mut self, error_type: &str, message: &str) -> Vec<Bytes> {
        let mut chunks = self.end_block();
        chunks.push(self.emit(
            "error",
            json!({ "type": "error", "error": { "type": error_type, "message": message } }),
        ));
        self.message_stop_sent = true;
        chunks
    }
}
