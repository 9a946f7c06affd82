//! # relaygate Types
//!
//! Core types, models, and error definitions for the relaygate gateway.
//!
//! - **`error`** - Typed error hierarchy for proxying, configuration and collaborators
//! - **`models`** - Domain models (Credential, RuntimeStats, NormalizedEvent, config)
//! - **`protocol`** - Upstream v1internal wire shapes
//!
//! ## Architecture Role
//!
//! `relaygate-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!        relaygate-types (this crate)
//!                │
//!                ▼
//!         relaygate-core
//!                │
//!                ▼
//!        relaygate-server
//! ```

pub mod error;
pub mod models;
pub mod protocol;

pub use error::{CollaboratorError, ConfigError, ProxyError};

pub use models::{
    AppConfig, Credential, FinishReason, ImageRef, NormalizedEvent, RetryConfig, RuntimeStats,
    SchedulerConfig, ServerConfig, ToolCall, Usage,
};
