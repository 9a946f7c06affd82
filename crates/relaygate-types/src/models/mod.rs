//! Core domain models for relaygate.

pub mod config;
mod credential;
mod events;
mod stats;

pub use config::{
    AppConfig, LoggingConfig, RetryConfig, SchedulerConfig, ServerConfig, StorageConfig,
    UpstreamConfig,
};
pub use credential::Credential;
pub use events::{FinishReason, ImageRef, NormalizedEvent, ToolCall, Usage};
pub use stats::{RuntimeStats, UsageEvent};
