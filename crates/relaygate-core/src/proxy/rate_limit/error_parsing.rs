use serde_json::Value;

/// An auth failure reported inside an otherwise successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedAuthFailure {
    pub status: u16,
    pub message: String,
}

const AUTH_STATUSES: [&str; 2] = ["UNAUTHENTICATED", "PERMISSION_DENIED"];

/// Detect `{"error": {"code": 401|403 | "status": "UNAUTHENTICATED"|...}}`,
/// optionally wrapped in an array or a `response` envelope.
pub fn embedded_auth_failure(value: &Value) -> Option<EmbeddedAuthFailure> {
    let root = match value {
        Value::Array(arr) => arr.first()?,
        other => other,
    };
    let error = root.get("error").or_else(|| root.get("response").and_then(|r| r.get("error")))?;

    let code = error.get("code").and_then(Value::as_u64).and_then(|c| u16::try_from(c).ok());
    let status_str = error.get("status").and_then(Value::as_str);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("authentication failed")
        .to_string();

    match (code, status_str) {
        (Some(c @ (401 | 403)), _) => Some(EmbeddedAuthFailure { status: c, message }),
        (_, Some(s)) if AUTH_STATUSES.contains(&s) => {
            let status = if s == "UNAUTHENTICATED" { 401 } else { 403 };
            Some(EmbeddedAuthFailure { status, message })
        },
        _ => None,
    }
}

/// Human-readable message from an upstream error body, falling back to the
/// raw text (truncated).
pub fn extract_error_message(body: &str) -> String {
    const MAX_LEN: usize = 500;

    if let Ok(json) = serde_json::from_str::<Value>(body.trim()) {
        let root = match &json {
            Value::Array(arr) => arr.first().unwrap_or(&json),
            other => other,
        };
        if let Some(msg) = root.get("error").and_then(|e| e.get("message")).and_then(Value::as_str)
        {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty upstream response".to_string();
    }
    trimmed.chars().take(MAX_LEN).collect()
}
