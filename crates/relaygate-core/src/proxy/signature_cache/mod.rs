//! Continuation-signature cache.
//!
//! The upstream rejects a replayed assistant turn unless it carries the
//! signature issued with the original output, so signatures are remembered
//! by tool-call id and by normalized text.

mod normalize;


pub use normalize::normalize_text;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

const SIGNATURE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const TOOL_CACHE_LIMIT: usize = 500;
const TEXT_CACHE_LIMIT: usize = 2000;

#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    timestamp: SystemTime,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self { data, timestamp: SystemTime::now() }
    }

    fn is_expired(&self) -> bool {
        self.timestamp.elapsed().unwrap_or(Duration::ZERO) > SIGNATURE_TTL
    }
}

/// Signature plus the text it was issued for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSignature {
    pub signature: String,
    pub text: String,
}

fn evict_expired<T>(cache: &mut HashMap<String, CacheEntry<T>>, limit: usize, name: &str) {
    if cache.len() <= limit {
        return;
    }
    let before = cache.len();
    cache.retain(|_, v| !v.is_expired());
    if cache.len() > limit {
        // Still over: drop the oldest half.
        let mut by_age: Vec<(SystemTime, String)> =
            cache.iter().map(|(k, v)| (v.timestamp, k.clone())).collect();
        by_age.sort();
        for (_, key) in by_age.into_iter().take(before / 2) {
            cache.remove(&key);
        }
    }
    tracing::debug!("[SignatureCache] {} cache cleanup: {} -> {} entries", name, before, cache.len());
}

#[derive(Default)]
pub struct SignatureCache {
    tool_signatures: RwLock<HashMap<String, CacheEntry<String>>>,
    text_signatures: RwLock<HashMap<String, CacheEntry<TextSignature>>>,
}

impl SignatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_tool_signature(&self, tool_call_id: &str, signature: &str) {
        if tool_call_id.is_empty() || signature.is_empty() {
            return;
        }
        tracing::debug!("[SignatureCache] Caching tool signature for id: {}", tool_call_id);
        let mut cache = self.tool_signatures.write();
        cache.insert(tool_call_id.to_string(), CacheEntry::new(signature.to_string()));
        evict_expired(&mut cache, TOOL_CACHE_LIMIT, "Tool");
    }

    pub fn get_tool_signature(&self, tool_call_id: &str) -> Option<String> {
        let cache = self.tool_signatures.read();
        cache.get(tool_call_id).filter(|e| !e.is_expired()).map(|e| e.data.clone())
    }

    /// Remember `signature` for `text`, keyed by its normalized form.
    pub fn cache_text_signature(&self, text: &str, signature: &str) {
        let key = normalize_text(text);
        if key.is_empty() || signature.is_empty() {
            return;
        }
        tracing::debug!(
            "[SignatureCache] Caching text signature (text_len={}, sig_len={})",
            key.len(),
            signature.len()
        );
        let mut cache = self.text_signatures.write();
        cache.insert(
            key,
            CacheEntry::new(TextSignature {
                signature: signature.to_string(),
                text: text.to_string(),
            }),
        );
        evict_expired(&mut cache, TEXT_CACHE_LIMIT, "Text");
    }

    pub fn get_text_signature(&self, text: &str) -> Option<TextSignature> {
        let key = normalize_text(text);
        if key.is_empty() {
            return None;
        }
        let cache = self.text_signatures.read();
        cache.get(&key).filter(|e| !e.is_expired()).map(|e| e.data.clone())
    }

    pub fn lookup_text_signature(&self, text: &str) -> Option<String> {
        self.get_text_signature(text).map(|entry| entry.signature)
    }

    pub fn tool_len(&self) -> usize {
        self.tool_signatures.read().len()
    }

    pub fn text_len(&self) -> usize {
        self.text_signatures.read().len()
    }

    pub fn clear(&self) {
        self.tool_signatures.write().clear();
        self.text_signatures.write().clear();
    }
}
