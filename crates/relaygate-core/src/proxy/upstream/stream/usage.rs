use relaygate_types::protocol::gemini::UpstreamUsageMetadata;
use relaygate_types::Usage;
use serde_json::Value;

/// Normalize `usageMetadata`. A missing completion count is inferred as
/// `total - prompt`.
pub fn normalize_usage(raw: &Value) -> Option<Usage> {
    let meta: UpstreamUsageMetadata = serde_json::from_value(raw.clone()).ok()?;
    if meta.prompt_token_count.is_none()
        && meta.candidates_token_count.is_none()
        && meta.total_token_count.is_none()
    {
        return None;
    }

    let prompt_tokens = meta.prompt_token_count.unwrap_or(0);
    let completion_tokens = meta
        .candidates_token_count
        .unwrap_or_else(|| meta.total_token_count.unwrap_or(0).saturating_sub(prompt_tokens));
    let total_tokens =
        meta.total_token_count.unwrap_or(prompt_tokens.saturating_add(completion_tokens));

    Some(Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens,
        reasoning_tokens: meta.thoughts_token_count.unwrap_or(0),
    })
}
