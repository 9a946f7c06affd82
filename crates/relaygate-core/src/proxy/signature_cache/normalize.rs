use regex::Regex;
use std::sync::OnceLock;

fn thinking_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used, reason = "literal pattern")]
    RE.get_or_init(|| Regex::new(r"(?s)<think(?:ing)?>.*?</think(?:ing)?>").expect("valid regex"))
}

fn stray_thinking_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used, reason = "literal pattern")]
    RE.get_or_init(|| Regex::new(r"</?think(?:ing)?>").expect("valid regex"))
}

fn markdown_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used, reason = "literal pattern")]
    RE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"))
}

/// Cache key form of assistant text: thinking blocks and markdown images
/// removed, surrounding whitespace trimmed.
pub fn normalize_text(text: &str) -> String {
    let without_blocks = thinking_block_re().replace_all(text, "");
    let without_tags = stray_thinking_tag_re().replace_all(&without_blocks, "");
    let without_images = markdown_image_re().replace_all(&without_tags, "");
    without_images.trim().to_string()
}
