use relaygate_types::NormalizedEvent;
use serde_json::Value;

use super::frame_decoder::unwrap_response;
use super::part_processor::PartProcessor;
use super::AdapterContext;

/// Classify one complete (non-streaming) response document.
pub async fn collect_events(document: &Value, ctx: &AdapterContext) -> Vec<NormalizedEvent> {
    let document = unwrap_response(document.clone());
    let mut processor = PartProcessor::new(ctx.clone());
    let mut events = processor.process_frame(&document).await;
    events.extend(processor.finish());
    events
}
