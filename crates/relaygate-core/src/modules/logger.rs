//! Tracing subscriber setup: console plus optional daily-rolling file.

use relaygate_types::models::LoggingConfig;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct LocalTimer;

impl fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().to_rfc3339())
    }
}

fn resolve_log_dir(config: &LoggingConfig, data_dir: Option<&PathBuf>) -> Option<PathBuf> {
    config.log_dir.clone().or_else(|| data_dir.map(|d| d.join("logs")))
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. The returned guard must be
/// kept alive for the file writer to flush.
pub fn init_logger(config: &LoggingConfig, data_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let _ = tracing_log::LogTracer::init();

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_timer(LocalTimer);

    let (file_layer, guard) = match resolve_log_dir(config, data_dir).filter(|_| config.log_to_file)
    {
        Some(log_dir) => {
            if let Err(e) = std::fs::create_dir_all(&log_dir) {
                eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
                (None, None)
            } else {
                let file_appender = tracing_appender::rolling::daily(log_dir, "relaygate.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let layer = fmt::Layer::new()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_timer(LocalTimer);
                (Some(layer), Some(guard))
            }
        },
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    tracing::info!(
        "Log system initialized (level: {}, file: {})",
        config.level,
        if guard.is_some() { "on" } else { "off" }
    );
    guard
}
