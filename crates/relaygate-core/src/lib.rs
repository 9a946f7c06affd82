//! # relaygate Core
//!
//! Protocol-translating gateway logic in front of a pool of OAuth upstream
//! credentials.
//!
//! ```text
//! relaygate-core/src/
//! ├── modules/          # config, logging, file-backed collaborators, OAuth client
//! └── proxy/
//!     ├── scheduler/    # credential selection, cooldowns, sticky session
//!     ├── orchestrator/ # retry / backoff / credential-switch state machine
//!     ├── upstream/     # v1internal client + stream decoder
//!     ├── signature_cache/
//!     ├── mappers/      # OpenAI / Claude / Gemini dialects
//!     ├── handlers/     # axum handlers
//!     └── server.rs     # router and AppState
//! ```

#![allow(
    clippy::significant_drop_tightening,
    reason = "Mutex guards are scoped to short critical sections"
)]
#![allow(
    clippy::redundant_else,
    reason = "Explicit else blocks improve readability in complex control flow"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(clippy::needless_continue, reason = "Explicit continue improves loop readability")]
#![allow(
    clippy::derive_partial_eq_without_eq,
    reason = "Some types intentionally don't implement Eq"
)]
// Test-only lints: allow panic!, println!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::assertions_on_result_states
    )
)]

pub mod modules;
pub mod proxy;

pub use proxy::{
    CredentialScheduler, CredentialStore, ImageStore, OAuthClient, RequestOrchestrator,
    SignatureCache, UsageLedger,
};
pub use relaygate_types::{AppConfig, Credential, NormalizedEvent, ProxyError};
