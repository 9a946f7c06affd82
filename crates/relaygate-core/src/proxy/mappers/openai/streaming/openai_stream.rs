use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use relaygate_types::NormalizedEvent;
use uuid::Uuid;

use super::stream_formatters::*;
use crate::proxy::mappers::openai::models::OpenAIUsage;
use crate::proxy::mappers::SseStream;
use crate::proxy::upstream::EventStream;

/// Encode normalized events as `chat.completion.chunk` SSE lines,
/// terminated by `data: [DONE]`.
pub fn create_openai_sse_stream(mut events: EventStream, model: String) -> SseStream {
    let stream_id = format!("chatcmpl-{}", Uuid::new_v4());
    let created_ts = Utc::now().timestamp();

    let stream = async_stream::stream! {
        let mut tool_index: u32 = 0;
        let mut final_usage: Option<OpenAIUsage> = None;

        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!("[OpenAI-SSE] Stream interrupted: {}", e);
                    yield Bytes::from(sse_line(&error_chunk(
                        &stream_id,
                        created_ts,
                        &model,
                        e.kind(),
                        &e.to_string(),
                    )));
                    break;
                },
            };

            let line = match event {
                NormalizedEvent::Text { text } => {
                    sse_line(&content_chunk(&stream_id, created_ts, &model, &text))
                },
                NormalizedEvent::Thinking { text } => {
                    sse_line(&reasoning_chunk(&stream_id, created_ts, &model, &text))
                },
                NormalizedEvent::Image(image) => {
                    sse_line(&content_chunk(&stream_id, created_ts, &model, &image.to_markdown()))
                },
                NormalizedEvent::ToolCall(call) => {
                    let line = sse_line(&tool_call_chunk(
                        &stream_id,
                        created_ts,
                        &model,
                        tool_index,
                        &call.id,
                        &call.name,
                        &call.arguments_json(),
                    ));
                    tool_index += 1;
                    line
                },
                NormalizedEvent::UsageMetadata(usage) => {
                    final_usage = Some(OpenAIUsage::from(usage));
                    continue;
                },
                NormalizedEvent::Finish { reason } => {
                    sse_line(&finish_chunk(&stream_id, created_ts, &model, reason.as_openai()))
                },
            };
            yield Bytes::from(line);
        }

        if let Some(usage) = final_usage {
            yield Bytes::from(sse_line(&usage_chunk(&stream_id, created_ts, &model, &usage)));
        }
        tracing::debug!("[OpenAI-SSE] Stream finished (tool_calls={})", tool_index);
        yield Bytes::from_static(DONE_LINE.as_bytes());
    };

    Box::pin(stream)
}
