use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use relaygate_types::ProxyError;
use serde_json::Value;
use std::fmt::Display;
use std::pin::Pin;

use crate::proxy::orchestrator::UpstreamFailure;
use crate::proxy::rate_limit::{embedded_auth_failure, parse_retry_time_from_body};

pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Value, ProxyError>> + Send>>;

/// Line buffer for `data: <json>` framing. Partial lines are held until
/// the next chunk completes them.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every complete frame it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            if let Some(frame) = parse_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Parse whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<Value> {
        let rest = self.buffer.split();
        parse_line(&rest)
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_line(raw: &[u8]) -> Option<Value> {
    let line = match std::str::from_utf8(raw) {
        Ok(s) => s.trim(),
        Err(e) => {
            let error = ProxyError::FrameDecode { message: format!("invalid utf-8: {}", e) };
            tracing::warn!("[Upstream] skipping frame: {}", error);
            return None;
        },
    };
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    // event:/id:/retry: lines carry nothing we need.
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            let error = ProxyError::FrameDecode { message: e.to_string() };
            tracing::warn!("[Upstream] skipping malformed frame ({} bytes): {}", payload.len(), error);
            None
        },
    }
}

/// Decode a byte stream into JSON frames. Malformed frames are skipped; a
/// transport error ends the stream with [`ProxyError::Stream`].
pub fn decode_frames<S, E>(source: S) -> FrameStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut buffer = FrameBuffer::new();
        let mut source = Box::pin(source);
        while let Some(item) = source.next().await {
            match item {
                Ok(bytes) => {
                    tracing::trace!("[Upstream] received chunk: {} bytes", bytes.len());
                    for frame in buffer.push(&bytes) {
                        yield Ok(frame);
                    }
                },
                Err(e) => {
                    yield Err(ProxyError::Stream { message: e.to_string() });
                    return;
                },
            }
        }
        if let Some(frame) = buffer.finish() {
            yield Ok(frame);
        }
    };
    Box::pin(stream)
}

/// Strip the v1internal `{"response": ...}` wrapper.
pub fn unwrap_response(mut frame: Value) -> Value {
    match frame.get_mut("response") {
        Some(inner) if inner.is_object() => inner.take(),
        _ => frame,
    }
}

/// Error object reported inside a successful HTTP response.
pub fn embedded_failure(frame: &Value) -> Option<UpstreamFailure> {
    if let Some(auth) = embedded_auth_failure(frame) {
        tracing::warn!("[Upstream] embedded auth failure {}: {}", auth.status, auth.message);
        return Some(UpstreamFailure::new(auth.status, auth.message, None));
    }

    let root = match frame {
        Value::Array(arr) => arr.first()?,
        other => other,
    };
    let root = root.get("response").filter(|r| r.is_object()).unwrap_or(root);
    let error = root.get("error")?;
    let status = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(500);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("upstream reported an error")
        .to_string();
    let retry_after = parse_retry_time_from_body(&frame.to_string());
    Some(UpstreamFailure::new(status, message, retry_after))
}
