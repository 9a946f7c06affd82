use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use relaygate_core::modules::config::get_data_dir;
use relaygate_core::proxy::upstream::UpstreamClient;
use relaygate_core::proxy::{load_scheduler, CredentialScheduler};
use relaygate_types::AppConfig;
use serde_json::json;

pub fn check_config(config: &AppConfig, json: bool) -> Result<()> {
    if json {
        let mut redacted = config.clone();
        redacted.server.api_key = mask_key(&redacted.server.api_key);
        redacted.upstream.client_secret = mask_key(&redacted.upstream.client_secret);
        println!("{}", serde_json::to_string_pretty(&redacted)?);
        return Ok(());
    }

    println!("{} Configuration is valid", "✓".green());
    println!("{}", "Server:".cyan().bold());
    println!("  Listen: {}", config.server.get_socket_addr());
    let api_key = if config.server.auth_enabled() {
        mask_key(&config.server.api_key)
    } else {
        "(disabled)".to_string()
    };
    println!("  API Key: {}", api_key);
    println!("  Heartbeat: {}s", config.server.heartbeat_interval_secs);
    println!("  Request timeout: {}s", config.server.request_timeout_secs);
    println!("{}", "Scheduling:".cyan().bold());
    println!("  Cooldown: {}ms", config.scheduler.cooldown_ms);
    println!("  Hourly limit: {}", config.scheduler.hourly_limit);
    println!("  Sticky usage: {}", config.scheduler.max_sticky_usage);
    println!("  Pool size: {}", config.scheduler.pool_size);
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Retryable statuses: {:?}", config.retry.retryable_statuses);
    println!("{}", "Upstream:".cyan().bold());
    println!("  Base URL: {}", config.upstream.base_url);
    Ok(())
}

pub async fn list_credentials(config: &AppConfig, json: bool) -> Result<()> {
    let data_dir = get_data_dir(config).map_err(|e| anyhow::anyhow!(e))?;
    let http =
        UpstreamClient::build_http_client(&config.upstream).map_err(|e| anyhow::anyhow!(e))?;
    let scheduler =
        load_scheduler(config, &data_dir, http).await.map_err(|e| anyhow::anyhow!(e))?;
    let credentials = scheduler.credentials();

    if json {
        let rows: Vec<_> = credentials
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "email": c.email,
                    "project_id": c.project_id,
                    "enabled": c.enabled,
                    "disabled_reason": c.disabled_reason,
                    "cooldown_until": cooldown_until(&scheduler, &c.id),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if credentials.is_empty() {
        println!("{}", "No credentials found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Email", "Project", "Status", "Cooldown", "Last used"]);

    for cred in &credentials {
        let status = if cred.enabled {
            Cell::new("Enabled").fg(Color::Green)
        } else {
            Cell::new(format!("Disabled ({})", cred.disabled_reason.as_deref().unwrap_or("-")))
                .fg(Color::Red)
        };
        let cooldown = match cooldown_until(&scheduler, &cred.id) {
            Some(until) => Cell::new(format!("until {}", format_ms(until))).fg(Color::Yellow),
            None => Cell::new("-"),
        };
        let stats = scheduler.runtime_stats(&cred.id);
        let last_used =
            if stats.last_used > 0 { format_ms(stats.last_used) } else { "never".to_string() };

        table.add_row(vec![
            Cell::new(&cred.id),
            Cell::new(cred.email.as_deref().unwrap_or("-")),
            Cell::new(cred.project_id.as_deref().unwrap_or("-")),
            status,
            cooldown,
            Cell::new(last_used),
        ]);
    }

    let enabled = credentials.iter().filter(|c| c.enabled).count();
    println!("{table}");
    println!("\n{} credentials total, {} enabled", credentials.len(), enabled);
    Ok(())
}

fn cooldown_until(scheduler: &CredentialScheduler, credential_id: &str) -> Option<i64> {
    if !scheduler.in_cooldown(credential_id) {
        return None;
    }
    scheduler.runtime_stats(credential_id).cooldown_until(scheduler.config().cooldown_ms)
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn mask_key(key: &str) -> String {
    if key.len() <= 8 {
        return "*".repeat(key.len());
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}
