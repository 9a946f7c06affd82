use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

static DURATION_REGEX: OnceLock<Regex> = OnceLock::new();
static RETRY_M_S_REGEX: OnceLock<Regex> = OnceLock::new();
static RETRY_S_REGEX: OnceLock<Regex> = OnceLock::new();
static QUOTA_RESET_REGEX: OnceLock<Regex> = OnceLock::new();
static RETRY_AFTER_REGEX: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used, reason = "literal patterns")]
fn get_duration_regex() -> &'static Regex {
    DURATION_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+(?:\.\d+)?)\s*s)?\s*$")
            .expect("Duration regex is valid")
    })
}

#[allow(clippy::expect_used, reason = "literal patterns")]
fn get_retry_m_s_regex() -> &'static Regex {
    RETRY_M_S_REGEX.get_or_init(|| {
        Regex::new(r"(?i)try again in (\d+)m\s*(\d+)s").expect("Retry m s regex is valid")
    })
}

#[allow(clippy::expect_used, reason = "literal patterns")]
fn get_retry_s_regex() -> &'static Regex {
    RETRY_S_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:try again in|backoff for|wait)\s*(\d+)s").expect("Retry s regex is valid")
    })
}

#[allow(clippy::expect_used, reason = "literal patterns")]
fn get_quota_reset_regex() -> &'static Regex {
    QUOTA_RESET_REGEX.get_or_init(|| {
        Regex::new(r"(?i)quota will reset in (\d+) second").expect("Quota reset regex is valid")
    })
}

#[allow(clippy::expect_used, reason = "literal patterns")]
fn get_retry_after_regex() -> &'static Regex {
    RETRY_AFTER_REGEX.get_or_init(|| {
        Regex::new(r"(?i)retry after (\d+) second").expect("Retry after regex is valid")
    })
}

/// Parse a Google-style duration (`"1.5s"`, `"1h2m3s"`, `"500ms"`).
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(ms) = trimmed.strip_suffix("ms") {
        return ms.trim().parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| {
            Duration::from_micros((v * 1000.0) as u64)
        });
    }

    let caps = get_duration_regex().captures(trimmed)?;
    if caps.get(1).is_none() && caps.get(2).is_none() && caps.get(3).is_none() {
        tracing::debug!("[timeparse] no duration components in '{}'", s);
        return None;
    }

    let hours = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()).unwrap_or(0);
    let minutes = caps.get(2).and_then(|m| m.as_str().parse::<u64>().ok()).unwrap_or(0);
    let seconds = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok()).unwrap_or(0.0);

    let whole = hours * 3600 + minutes * 60;
    Some(Duration::from_secs(whole) + Duration::from_secs_f64(seconds))
}

/// Retry hint embedded in an error body: `error.details[].retryDelay`,
/// `error.details[].metadata.quotaResetDelay`, `error.retry_after`, or one
/// of the free-text phrasings the upstream uses.
pub fn parse_retry_time_from_body(body: &str) -> Option<Duration> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
            if let Some(delay) = retry_delay_from_json(&json) {
                return Some(delay);
            }
        }
    }

    if let Some(caps) = get_retry_m_s_regex().captures(body) {
        if let (Ok(m), Ok(s)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) {
            return Some(Duration::from_secs(m * 60 + s));
        }
    }

    for re in [get_retry_s_regex(), get_quota_reset_regex(), get_retry_after_regex()] {
        if let Some(caps) = re.captures(body) {
            if let Ok(s) = caps[1].parse::<u64>() {
                return Some(Duration::from_secs(s));
            }
        }
    }

    None
}

fn retry_delay_from_json(json: &Value) -> Option<Duration> {
    // Array bodies wrap the error object in a single element.
    let root = match json {
        Value::Array(arr) => arr.first()?,
        other => other,
    };
    let error = root.get("error")?;

    if let Some(details) = error.get("details").and_then(Value::as_array) {
        for detail in details {
            let candidates = [
                detail.get("retryDelay"),
                detail.get("metadata").and_then(|m| m.get("quotaResetDelay")),
            ];
            for delay_str in candidates.into_iter().flatten().filter_map(Value::as_str) {
                if let Some(delay) = parse_duration_string(delay_str) {
                    tracing::debug!("[JSONparse] retry delay '{}' from error details", delay_str);
                    return Some(delay);
                }
            }
        }
    }

    error.get("retry_after").and_then(Value::as_u64).map(Duration::from_secs)
}

/// Combined hint: the `Retry-After` header (delta seconds) wins over the body.
pub fn parse_retry_delay(retry_after_header: Option<&str>, body: &str) -> Option<Duration> {
    if let Some(header) = retry_after_header {
        if let Ok(seconds) = header.trim().parse::<f64>() {
            if seconds >= 0.0 {
                return Some(Duration::from_secs_f64(seconds));
            }
        }
    }
    parse_retry_time_from_body(body)
}
