//! Proxy module - credential pool gateway
//!
//! - Credential scheduling with cooldowns, hourly caps and sticky affinity
//! - Retry / credential-switch orchestration
//! - v1internal streaming adapter with continuation-signature caching
//! - OpenAI, Claude, Gemini dialect translation

pub mod clock;
pub mod collaborators;
pub mod common;
pub mod handlers;
pub mod mappers;
pub mod middleware;
pub mod orchestrator;
pub mod rate_limit;
pub mod scheduler;
pub mod server;
pub mod signature_cache;
pub mod upstream;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{CredentialStore, ImageStore, OAuthClient, TokenGrant, UsageLedger};
pub use orchestrator::{AttemptRecord, Dispatched, RequestOrchestrator, UpstreamFailure};
pub use scheduler::CredentialScheduler;
pub use server::{build_proxy_router, load_scheduler, AppState, AxumServer};
pub use signature_cache::SignatureCache;
