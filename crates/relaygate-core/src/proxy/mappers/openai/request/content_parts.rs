use super::super::models::*;
use serde_json::{json, Value};

pub fn transform_content_block(block: &OpenAIContentBlock) -> Option<Value> {
    match block {
        OpenAIContentBlock::Text { text } => Some(json!({ "text": text })),
        OpenAIContentBlock::ImageUrl { image_url } => transform_image_url(&image_url.url),
    }
}

/// Split `data:<mime>;base64,<data>`.
pub fn parse_data_uri(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime = meta.split(';').next().filter(|m| !m.is_empty()).unwrap_or("image/jpeg");
    Some((mime, data))
}

fn transform_image_url(url: &str) -> Option<Value> {
    if url.starts_with("data:") {
        let Some((mime_type, data)) = parse_data_uri(url) else {
            tracing::warn!("[OpenAI-Request] Skipping malformed data URI");
            return None;
        };
        Some(json!({ "inlineData": { "mimeType": mime_type, "data": data } }))
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Some(json!({ "fileData": { "fileUri": url, "mimeType": guess_image_mime(url) } }))
    } else {
        tracing::warn!("[OpenAI-Request] Unsupported image URL scheme, skipping");
        None
    }
}

fn guess_image_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
