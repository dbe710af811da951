//! Runtime configuration for a [`crate::Cache`].

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Tunables governing cache scope and admission, plus a clock hook so tests
/// can pin "now" instead of racing the system clock.
#[derive(Clone)]
pub struct CacheConfig {
    /// The request header whose value scopes a private response to a caller.
    /// Absent on a request, private responses are never served from cache
    /// and never stored.
    pub private_cache_key_header: String,
    /// The largest serialized response this cache will admit, in bytes.
    /// `None` means no ceiling.
    pub max_cache_item_size: Option<usize>,
    /// Upper bound on any derived TTL, in seconds, regardless of what
    /// `Cache-Control`/`Expires` would otherwise produce.
    pub max_ttl: u64,
    /// Returns the current time as Unix epoch seconds. Overridable so tests
    /// can run against a fixed clock rather than real wall time.
    pub now: Arc<dyn Fn() -> i64 + Send + Sync>,
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("private_cache_key_header", &self.private_cache_key_header)
            .field("max_cache_item_size", &self.max_cache_item_size)
            .field("max_ttl", &self.max_ttl)
            .field("now", &"<fn>")
            .finish()
    }
}

fn system_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            private_cache_key_header: "X-Private-Cache-Key".to_string(),
            max_cache_item_size: None,
            max_ttl: 1 << 31,
            now: Arc::new(system_now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_header_name_matches_convention() {
        let config = CacheConfig::default();
        assert_eq!(config.private_cache_key_header, "X-Private-Cache-Key");
    }

    #[test]
    fn clock_hook_is_overridable() {
        let config = CacheConfig { now: Arc::new(|| 42), ..Default::default() };
        assert_eq!((config.now)(), 42);
    }
}
