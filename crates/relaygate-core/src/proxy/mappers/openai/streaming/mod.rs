mod openai_stream;
mod stream_formatters;


pub use openai_stream::create_openai_sse_stream;
pub use stream_formatters::sse_line;
