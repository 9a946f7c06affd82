//! Native generateContent dialect.

pub mod response;
pub mod wrapper;


pub use response::{build_gemini_response, create_gemini_sse_stream, error_document};
pub use wrapper::transform_gemini_request;
