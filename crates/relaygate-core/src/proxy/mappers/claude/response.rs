use relaygate_types::{FinishReason, NormalizedEvent};

use super::models::*;

/// Fold a complete event sequence into one Messages response.
pub fn build_claude_response(events: &[NormalizedEvent], model: &str) -> ClaudeResponse {
    let mut content: Vec<ContentBlock> = Vec::new();
    let mut usage = ClaudeUsage::default();
    let mut finish = FinishReason::Stop;

    for event in events {
        match event {
            NormalizedEvent::Thinking { text } => match content.last_mut() {
                Some(ContentBlock::Thinking { thinking, .. }) => thinking.push_str(text),
                _ => content.push(ContentBlock::Thinking {
                    thinking: text.clone(),
                    signature: Some(String::new()),
                }),
            },
            NormalizedEvent::Text { text } => push_text(&mut content, text),
            NormalizedEvent::Image(image) => push_text(&mut content, &image.to_markdown()),
            NormalizedEvent::ToolCall(call) => content.push(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.args.clone(),
            }),
            NormalizedEvent::UsageMetadata(u) => usage = ClaudeUsage::from(*u),
            NormalizedEvent::Finish { reason } => finish = *reason,
        }
    }

    ClaudeResponse {
        id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
        type_: "message".to_string(),
        role: "assistant".to_string(),
        model: model.to_string(),
        content,
        stop_reason: finish.as_claude().to_string(),
        stop_sequence: None,
        usage,
    }
}

fn push_text(content: &mut Vec<ContentBlock>, text: &str) {
    match content.last_mut() {
        Some(ContentBlock::Text { text: existing }) => existing.push_str(text),
        _ => content.push(ContentBlock::Text { text: text.to_string() }),
    }
}
