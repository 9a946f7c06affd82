use futures::StreamExt;
use relaygate_types::NormalizedEvent;

use super::state::{BlockType, StreamingState};
use crate::proxy::mappers::claude::models::ClaudeUsage;
use crate::proxy::mappers::SseStream;
use crate::proxy::upstream::EventStream;

/// Encode normalized events as Messages API SSE:
/// message_start, content blocks, message_delta, message_stop.
pub fn create_claude_sse_stream(mut events: EventStream, model: String) -> SseStream {
    let stream = async_stream::stream! {
        let mut state = StreamingState::new(&model);
        if let Some(start) = state.emit_message_start() {
            yield start;
        }

        while let Some(item) = events.next().await {
            let chunks = match item {
                Ok(NormalizedEvent::Text { text }) => state.append(BlockType::Text, &text),
                Ok(NormalizedEvent::Thinking { text }) => state.append(BlockType::Thinking, &text),
                Ok(NormalizedEvent::Image(image)) => {
                    state.append(BlockType::Text, &image.to_markdown())
                },
                Ok(NormalizedEvent::ToolCall(call)) => {
                    state.emit_tool_use(&call.id, &call.name, &call.arguments_json())
                },
                Ok(NormalizedEvent::UsageMetadata(usage)) => {
                    state.usage = ClaudeUsage::from(usage);
                    continue;
                },
                Ok(NormalizedEvent::Finish { reason }) => {
                    state.finish_reason = Some(reason);
                    continue;
                },
                Err(e) => {
                    tracing::error!("[Claude-SSE] Stream interrupted: {}", e);
                    for chunk in state.emit_error(e.kind(), &e.to_string()) {
                        yield chunk;
                    }
                    break;
                },
            };
            for chunk in chunks {
                yield chunk;
            }
        }

        for chunk in state.emit_finish() {
            yield chunk;
        }
    };

    Box::pin(stream)
}
