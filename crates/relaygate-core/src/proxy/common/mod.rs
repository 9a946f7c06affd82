//! Shared helpers for mappers and handlers.

pub mod json_schema;
pub mod random_id;

pub use json_schema::clean_json_schema;
pub use random_id::{generate_random_id, generate_tool_call_id};
