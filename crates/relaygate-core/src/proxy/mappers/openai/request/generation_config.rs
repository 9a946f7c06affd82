use super::super::models::OpenAIRequest;
use serde_json::{json, Map, Value};

pub fn build_generation_config(request: &OpenAIRequest) -> Option<Value> {
    let mut config = Map::new();

    if let Some(t) = request.temperature {
        config.insert("temperature".to_string(), json!(t));
    }
    if let Some(p) = request.top_p {
        config.insert("topP".to_string(), json!(p));
    }
    if let Some(k) = request.top_k {
        config.insert("topK".to_string(), json!(k));
    }
    if let Some(max) = request.max_completion_tokens.or(request.max_tokens) {
        config.insert("maxOutputTokens".to_string(), json!(max));
    }
    if let Some(n) = request.n {
        config.insert("candidateCount".to_string(), json!(n));
    }

    match &request.stop {
        Some(Value::String(s)) => {
            config.insert("stopSequences".to_string(), json!([s]));
        },
        Some(Value::Array(arr)) if !arr.is_empty() => {
            config.insert("stopSequences".to_string(), Value::Array(arr.clone()));
        },
        _ => {},
    }

    if let Some(fmt) = &request.response_format {
        if fmt.r#type == "json_object" || fmt.r#type == "json_schema" {
            config.insert("responseMimeType".to_string(), json!("application/json"));
        }
    }

    if let Some(budget) = request.thinking_budget {
        config.insert(
            "thinkingConfig".to_string(),
            json!({ "includeThoughts": true, "thinkingBudget": budget }),
        );
    }

    (!config.is_empty()).then_some(Value::Object(config))
}
