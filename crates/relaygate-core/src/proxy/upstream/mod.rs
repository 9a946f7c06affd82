//! v1internal upstream: HTTP client and response adapter.

pub mod client;
pub mod stream;

pub use client::UpstreamClient;
pub use stream::{collect_events, AdapterContext, EventStream};
