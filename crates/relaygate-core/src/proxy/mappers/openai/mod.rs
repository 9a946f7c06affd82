pub mod models;
pub mod request;
pub mod response;
pub mod streaming;

pub use models::*;
pub use request::transform_openai_request;
pub use response::build_openai_response;
pub use streaming::create_openai_sse_stream;
