use relaygate_types::{FinishReason, ImageRef, NormalizedEvent, ToolCall, Usage};
use serde_json::{json, Value};

use super::usage::normalize_usage;
use super::AdapterContext;
use crate::proxy::common::generate_tool_call_id;

/// Per-response classification state.
///
/// Plain text accumulates with the latest signature seen on any text part;
/// tool calls are held back and emitted as one batch at the finish
/// boundary.
pub struct PartProcessor {
    ctx: AdapterContext,
    text: String,
    text_signature: Option<String>,
    pending_tools: Vec<ToolCall>,
    emitted_tools: usize,
    usage: Option<Usage>,
    finish_reason: Option<String>,
    finished: bool,
}

impl PartProcessor {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            text: String::new(),
            text_signature: None,
            pending_tools: Vec::new(),
            emitted_tools: 0,
            usage: None,
            finish_reason: None,
            finished: false,
        }
    }

    /// Classify one (unwrapped) response frame.
    pub async fn process_frame(&mut self, frame: &Value) -> Vec<NormalizedEvent> {
        let mut events = Vec::new();

        if let Some(usage) = frame.get("usageMetadata").and_then(normalize_usage) {
            self.usage = Some(usage);
        }

        let Some(candidate) =
            frame.get("candidates").and_then(Value::as_array).and_then(|c| c.first())
        else {
            return events;
        };

        if let Some(parts) = candidate.pointer("/content/parts").and_then(Value::as_array) {
            for part in parts {
                self.process_part(part, &mut events).await;
            }
        }

        if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
            tracing::debug!("[Upstream] finish reason: {}", reason);
            self.finish_reason = Some(reason.to_string());
            self.flush(&mut events);
        }

        events
    }

    async fn process_part(&mut self, part: &Value, events: &mut Vec<NormalizedEvent>) {
        let signature = part
            .get("thoughtSignature")
            .or_else(|| part.get("thought_signature"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());

        if let Some(call) = part.get("functionCall") {
            self.buffer_tool_call(call, signature);
            return;
        }

        if let Some(inline) = part.get("inlineData") {
            if let Some(event) = self.store_image(inline).await {
                events.push(event);
            }
            return;
        }

        let is_thought = part.get("thought").and_then(Value::as_bool).unwrap_or(false);
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if is_thought {
                if !text.is_empty() {
                    events.push(NormalizedEvent::Thinking { text: text.to_string() });
                }
            } else {
                self.text.push_str(text);
                if !text.is_empty() {
                    events.push(NormalizedEvent::Text { text: text.to_string() });
                }
            }
        }

        if let Some(sig) = signature {
            self.text_signature = Some(sig.to_string());
        }
    }

    fn buffer_tool_call(&mut self, call: &Value, signature: Option<&str>) {
        let name = call.get("name").and_then(Value::as_str).unwrap_or("unknown").to_string();
        let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
        let id = call
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map_or_else(generate_tool_call_id, str::to_string);

        if let Some(sig) = signature {
            self.ctx.signature_cache.cache_tool_signature(&id, sig);
        }

        tracing::debug!("[Upstream] buffered tool call {} ({})", name, id);
        self.pending_tools.push(ToolCall { id, name, args, signature: signature.map(str::to_string) });
    }

    async fn store_image(&self, inline: &Value) -> Option<NormalizedEvent> {
        let mime_type = inline.get("mimeType").and_then(Value::as_str).unwrap_or("image/png");
        let data = inline.get("data").and_then(Value::as_str).unwrap_or("");
        if data.is_empty() {
            return None;
        }

        let url = match self.ctx.image_store.store(data, mime_type).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("[Upstream] image store failed, inlining data URI: {}", e);
                format!("data:{};base64,{}", mime_type, data)
            },
        };
        Some(NormalizedEvent::Image(ImageRef { url, mime_type: mime_type.to_string() }))
    }

    /// Cache the accumulated text signature and release buffered tool calls.
    fn flush(&mut self, events: &mut Vec<NormalizedEvent>) {
        if let Some(signature) = self.text_signature.take() {
            if !self.text.trim().is_empty() {
                self.ctx.signature_cache.cache_text_signature(&self.text, &signature);
            }
        }
        self.text.clear();

        self.emitted_tools += self.pending_tools.len();
        events.extend(self.pending_tools.drain(..).map(NormalizedEvent::ToolCall));
    }

    /// Terminal events: anything still buffered, usage, then the finish
    /// marker. Idempotent.
    pub fn finish(&mut self) -> Vec<NormalizedEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut events = Vec::new();
        self.flush(&mut events);

        if let Some(usage) = self.usage {
            events.push(NormalizedEvent::UsageMetadata(usage));
        }

        let reason = if self.emitted_tools > 0 {
            FinishReason::ToolCalls
        } else {
            self.finish_reason.as_deref().map_or(FinishReason::Stop, FinishReason::from_upstream)
        };
        events.push(NormalizedEvent::Finish { reason });
        events
    }
}
