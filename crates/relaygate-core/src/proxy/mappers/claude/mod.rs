//! Claude Messages dialect.
//!
//! Requests are remapped onto the OpenAI pipeline by [`claude_to_openai_request`];
//! responses are encoded directly from normalized events.

pub mod bridge;
pub mod models;
pub mod response;
pub mod streaming;


pub use bridge::claude_to_openai_request;
pub use models::*;
pub use response::build_claude_response;
pub use streaming::create_claude_sse_stream;
