//! Config file loading, env overrides and data directory resolution.

use relaygate_types::{AppConfig, ConfigError};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Directory name for data storage under the home directory.
pub const DATA_DIR: &str = ".relaygate";
pub const CONFIG_FILE: &str = "config.json";

/// Resolve the data directory.
///
/// Priority:
/// 1. `storage.data_dir` from the config
/// 2. `RELAYGATE_DATA_DIR` environment variable
/// 3. `~/.relaygate`
pub fn get_data_dir(config: &AppConfig) -> Result<PathBuf, String> {
    let data_dir = if let Some(dir) = &config.storage.data_dir {
        dir.clone()
    } else if let Ok(custom_dir) = std::env::var("RELAYGATE_DATA_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = dirs::home_dir().ok_or("Cannot get home directory")?;
        home.join(DATA_DIR)
    };

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
    }

    Ok(data_dir)
}

/// Load the configuration.
///
/// An explicit path must exist. Without one, `<data_dir>/config.json` is used
/// when present, otherwise defaults. Env overrides apply last, then the
/// result is validated.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound { path: p.display().to_string() });
            }
            read_config_file(p)?
        },
        None => {
            let default_path = dirs::home_dir().map(|h| h.join(DATA_DIR).join(CONFIG_FILE));
            match default_path {
                Some(p) if p.exists() => read_config_file(&p)?,
                _ => AppConfig::default(),
            }
        },
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::unreadable(path, &e))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::malformed(path, &e))
}

/// Apply `RELAYGATE_*` environment overrides.
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<(), ConfigError> {
    if let Ok(port) = std::env::var("RELAYGATE_PORT") {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
            field: "RELAYGATE_PORT".to_string(),
            message: format!("'{}' is not a valid port", port),
        })?;
    }
    if let Ok(host) = std::env::var("RELAYGATE_HOST") {
        if !host.trim().is_empty() {
            config.server.host = host.trim().to_string();
        }
    }
    if let Ok(key) = std::env::var("RELAYGATE_API_KEY") {
        config.server.api_key = key;
    }
    if let Ok(raw) = std::env::var("RELAYGATE_UPSTREAM_URL") {
        let url = raw.trim().trim_end_matches('/').to_string();
        if url::Url::parse(&url).is_err() {
            tracing::warn!("RELAYGATE_UPSTREAM_URL is not a valid URL, keeping configured value");
        } else {
            config.upstream.base_url = url;
        }
    }
    if let Ok(dir) = std::env::var("RELAYGATE_DATA_DIR") {
        if !dir.trim().is_empty() {
            config.storage.data_dir = Some(PathBuf::from(dir));
        }
    }
    Ok(())
}

/// Run field validation, reporting the first offending field.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    config.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        ConfigError::Invalid { field, message: errors.to_string() }
    })
}

/// Save the configuration atomically.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let temp_path = path.with_extension("json.tmp");
    let content =
        serde_json::to_string_pretty(config).map_err(|e| ConfigError::write_failed(path, e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::write_failed(path, e))?;
    }
    std::fs::write(&temp_path, content).map_err(|e| ConfigError::write_failed(path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| ConfigError::write_failed(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.scheduler.hourly_limit = 7;
        config.retry.retryable_statuses = vec![500, 503];
        save_config(&config, &path).unwrap();

        let loaded = read_config_file(&path).unwrap();
        assert_eq!(loaded.scheduler.hourly_limit, 7);
        assert_eq!(loaded.retry.retryable_statuses, vec![500, 503]);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"retry": {"max_attempts": 0}}"#).unwrap();

        let parsed = read_config_file(&path).unwrap();
        let err = validate_config(&parsed).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "retry"));
    }

    #[test]
    fn test_malformed_json_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(read_config_file(&path), Err(ConfigError::Malformed { .. })));
    }
}
