mod claude_stream;
mod state;

pub use claude_stream::create_claude_sse_stream;
pub use state::{BlockType, StreamingState};
