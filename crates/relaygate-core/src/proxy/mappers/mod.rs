//! Downstream dialect translation.
//!
//! - `openai`: chat completions (the shared pipeline)
//! - `claude`: messages, remapped onto the OpenAI pipeline
//! - `gemini`: native generateContent, passed through with credential
//!   identifiers injected

pub mod claude;
pub mod gemini;
pub mod openai;

use relaygate_types::protocol::gemini::GenerateRequest;

/// Dialect-independent request consumed by the upstream client.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalRequest {
    pub model: String,
    pub stream: bool,
    pub request: GenerateRequest,
}

/// Encoded downstream SSE bytes. Errors are already rendered in-band.
pub type SseStream = std::pin::Pin<Box<dyn futures::Stream<Item = bytes::Bytes> + Send>>;
