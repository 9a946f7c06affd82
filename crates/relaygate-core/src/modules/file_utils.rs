//! File helpers shared by the file-backed collaborators.

use std::path::Path;

/// Write JSON to a temp sibling, then rename over the target.
pub async fn atomic_write_json<T: serde::Serialize + ?Sized>(
    path: &Path,
    content: &T,
) -> Result<(), String> {
    let temp_path = path.with_extension("json.tmp");
    let json_str =
        serde_json::to_string_pretty(content).map_err(|e| format!("JSON serialize: {}", e))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("Failed to create directory: {}", e))?;
    }

    tokio::fs::write(&temp_path, &json_str)
        .await
        .map_err(|e| format!("Failed to write temp file: {}", e))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| format!("Failed to rename file: {}", e))?;

    Ok(())
}

/// Read a JSON file, returning `None` when it does not exist yet.
pub async fn read_json_if_exists<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
    }
}
