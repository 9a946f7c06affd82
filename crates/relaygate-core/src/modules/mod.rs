//! Configuration, logging and the default file-backed collaborators.

pub mod config;
pub mod credential_store;
pub(crate) mod file_utils;
pub mod image_store;
pub mod logger;
pub mod oauth;
pub mod usage_ledger;

pub use credential_store::{JsonCredentialStore, MemoryCredentialStore};
pub use image_store::LocalImageStore;
pub use oauth::GoogleOAuthClient;
pub use usage_ledger::{JsonUsageLedger, MemoryUsageLedger};
