//! Upstream response adapter.
//!
//! Decodes `data: <json>` framing and classifies candidate parts into
//! [`NormalizedEvent`]s. The streaming and non-streaming paths share one
//! [`PartProcessor`], so both populate the signature cache the same way.

mod collector;
mod frame_decoder;
mod part_processor;
mod usage;


pub use collector::collect_events;
pub use frame_decoder::{decode_frames, embedded_failure, unwrap_response, FrameBuffer, FrameStream};
pub use part_processor::PartProcessor;
pub use usage::normalize_usage;

use futures::{Stream, StreamExt};
use relaygate_types::{NormalizedEvent, ProxyError};
use std::pin::Pin;
use std::sync::Arc;

use crate::proxy::collaborators::ImageStore;
use crate::proxy::signature_cache::SignatureCache;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<NormalizedEvent, ProxyError>> + Send>>;

/// Process-wide collaborators the adapter writes into.
#[derive(Clone)]
pub struct AdapterContext {
    pub signature_cache: Arc<SignatureCache>,
    pub image_store: Arc<dyn ImageStore>,
}

impl AdapterContext {
    pub fn new(signature_cache: Arc<SignatureCache>, image_store: Arc<dyn ImageStore>) -> Self {
        Self { signature_cache, image_store }
    }
}

/// Lazily turn decoded frames into normalized events. Dropping the
/// returned stream drops the frame source, which closes the upstream
/// connection.
pub fn normalize_stream(mut frames: FrameStream, ctx: AdapterContext) -> EventStream {
    let stream = async_stream::stream! {
        let mut processor = PartProcessor::new(ctx);
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => {
                    let frame = unwrap_response(frame);
                    for event in processor.process_frame(&frame).await {
                        yield Ok(event);
                    }
                },
                Err(e) => {
                    tracing::error!("[Upstream] stream aborted: {}", e);
                    yield Err(e);
                    return;
                },
            }
        }
        for event in processor.finish() {
            yield Ok(event);
        }
    };
    Box::pin(stream)
}
