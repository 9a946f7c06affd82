//! Listener, upstream endpoint, storage and logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://cloudcode-pa.googleapis.com/v1internal";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Downstream HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[validate(range(min = 1024_u16, max = 65535_u16))]
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client API key; empty disables authentication
    #[serde(default)]
    pub api_key: String,
    /// SSE keep-alive period
    #[validate(range(min = 1_u64, max = 300_u64))]
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    #[validate(range(min = 30_u64, max = 3600_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: String::new(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            request_timeout_secs: default_request_timeout(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerConfig {
    /// Get the full bind socket address.
    pub fn get_socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Upstream generation endpoint and OAuth client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpstreamConfig {
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[validate(url)]
    #[serde(default = "default_token_url")]
    pub oauth_token_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            oauth_token_url: default_token_url(),
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Where the file-backed collaborators keep their data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Root directory; None resolves to `~/.relaygate`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    /// Base URL used when handing out stored image links
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            credentials_file: default_credentials_file(),
            ledger_file: default_ledger_file(),
            images_dir: default_images_dir(),
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), log_to_file: false, log_dir: None }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8045
}

const fn default_heartbeat_interval() -> u64 {
    15
}

pub const fn default_request_timeout() -> u64 {
    300
}

const fn default_body_limit_mb() -> usize {
    100
}

fn default_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_OAUTH_TOKEN_URL.to_string()
}

fn default_user_agent() -> String {
    "antigravity/1.11.9 linux/amd64".to_string()
}

const fn default_connect_timeout() -> u64 {
    20
}

fn default_credentials_file() -> String {
    "credentials.json".to_string()
}

fn default_ledger_file() -> String {
    "usage_ledger.json".to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
