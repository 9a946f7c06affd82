use rand::Rng;

/// 8 random alphanumerics, used for response ids.
pub fn generate_random_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

/// Id for a tool call the upstream returned without one.
pub fn generate_tool_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}
