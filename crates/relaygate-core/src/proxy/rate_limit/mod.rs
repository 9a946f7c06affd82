//! Retry-delay hints and error-body classification for upstream failures.

mod error_parsing;
mod parser;


pub use error_parsing::{embedded_auth_failure, extract_error_message, EmbeddedAuthFailure};
pub use parser::{parse_duration_string, parse_retry_delay, parse_retry_time_from_body};
