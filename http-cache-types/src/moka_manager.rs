//! The default in-memory [`CacheBackend`], backed by
//! [`moka`](https://github.com/moka-rs/moka)'s async cache.
//!
//! `moka::future::Cache` normally applies one TTL to every entry in the
//! cache. `set(key, value, ttlSeconds)` needs to honor a *per-call* TTL
//! (settings and response blobs for the same URI are written with the same
//! TTL, but that TTL varies call to call depending on the response that
//! produced it), so each stored value is paired with its own `Duration` and
//! expired with a [`moka::Expiry`] policy keyed off that duration instead of
//! a cache-wide default.

use std::{fmt, sync::Arc, time::Duration};

use moka::{future::Cache, Expiry};

use crate::{CacheBackend, Result};

struct PerEntryExpiry;

impl Expiry<String, Arc<(String, Duration)>> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Arc<(String, Duration)>,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

/// Implements [`CacheBackend`] with [`moka`](https://github.com/moka-rs/moka)
/// as the backend. This is the default manager used when no other backend is
/// configured.
#[derive(Clone)]
pub struct MokaManager {
    cache: Cache<String, Arc<(String, Duration)>>,
}

impl fmt::Debug for MokaManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaManager").finish_non_exhaustive()
    }
}

impl Default for MokaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MokaManager {
    /// Creates a new, empty manager with no entry-count ceiling beyond
    /// `moka`'s own defaults.
    #[must_use]
    pub fn new() -> Self {
        let cache =
            Cache::builder().expire_after(PerEntryExpiry).build();
        Self { cache }
    }
}

#[async_trait::async_trait]
impl CacheBackend for MokaManager {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.0.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_seconds: u64,
    ) -> Result<()> {
        self.cache
            .insert(
                key.to_string(),
                Arc::new((value, Duration::from_secs(ttl_seconds))),
            )
            .await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}
