//! relaygate - headless gateway daemon
//!
//! Serves OpenAI, Claude and Gemini compatible endpoints in front of a pool
//! of OAuth upstream credentials.
//!
//! Access via: http://127.0.0.1:8045

use anyhow::Result;
use clap::Parser;
use relaygate_core::modules::config::{get_data_dir, load_config};
use relaygate_core::modules::logger::init_logger;
use relaygate_core::proxy::{AppState, AxumServer};
use relaygate_types::AppConfig;
use tracing::info;

mod cli;
mod commands;
mod server_utils;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).map_err(|e| anyhow::anyhow!(e))?;
    apply_cli_overrides(&mut config, &cli);
    relaygate_core::modules::config::validate_config(&config).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::CheckConfig { json } => commands::check_config(&config, json),
        Commands::ListCredentials { json } => commands::list_credentials(&config, json).await,
    }
}

fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let data_dir = get_data_dir(&config).map_err(|e| anyhow::anyhow!(e))?;
    let _log_guard = init_logger(&config.logging, Some(&data_dir));

    info!(
        "relaygate {} (built {}) starting on {}",
        env!("GIT_VERSION"),
        env!("BUILD_TIME"),
        config.server.get_socket_addr()
    );
    info!("Data directory: {}", data_dir.display());

    let state = AppState::from_config(&config).await.map_err(|e| anyhow::anyhow!(e))?;
    info!("Application state initialized");
    info!("Proxy endpoints at http://{}/v1/", config.server.get_socket_addr());

    AxumServer::new(state)
        .run_until(server_utils::shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
