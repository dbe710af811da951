//! An optional disk-backed [`CacheBackend`], using
//! [`cacache`](https://github.com/zkat/cacache-rs) for storage.
//!
//! Unlike `moka`, `cacache` has no notion of per-entry expiry, so the TTL is
//! stored alongside the value as an absolute expiry timestamp and checked on
//! read; an expired entry is treated as a miss. Expired entries aren't
//! actively deleted — a later `set` for the same key overwrites it, or it
//! simply stays on disk unread.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{CacheBackend, Result};

/// Implements [`CacheBackend`] with `cacache` as the backend.
#[derive(Debug, Clone)]
pub struct CACacheManager {
    /// Directory where the cache is stored on disk.
    pub path: String,
}

impl Default for CACacheManager {
    fn default() -> Self {
        CACacheManager { path: "./http-cacache".into() }
    }
}

impl CACacheManager {
    /// Creates a manager rooted at the given directory.
    #[must_use]
    pub fn new(path: String) -> Self {
        Self { path }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct Entry {
    value: String,
    expires_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait::async_trait]
impl CacheBackend for CACacheManager {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry: Entry = match cacache::read(&self.path, key).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entry) => entry,
                Err(_) => return Ok(None),
            },
            Err(_) => return Ok(None),
        };
        if entry.expires_at <= now_secs() {
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_seconds: u64,
    ) -> Result<()> {
        let entry = Entry { value, expires_at: now_secs() + ttl_seconds };
        let bytes = serde_json::to_vec(&entry)?;
        cacache::write(&self.path, key, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        cacache::clear(&self.path).await?;
        Ok(())
    }
}
