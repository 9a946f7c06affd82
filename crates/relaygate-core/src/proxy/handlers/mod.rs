// Handlers module - API endpoint handlers

pub mod claude;
pub mod common;
pub mod gemini;
pub mod health;
pub mod images;
pub mod models;
pub mod openai;

#[cfg(test)]
mod tests;
