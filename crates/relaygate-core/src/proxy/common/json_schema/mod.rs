mod cleaner;
mod merge;
mod recursive;
mod union;

pub use cleaner::clean_json_schema;
