// Cache store capability and an in-memory implementation.
// Every operation is an await point; implementations must be safe to share across tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

/// Default TTL for cached pages and items: 1 hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Expired entries are swept from a [`MemoryCache`] once every this many writes.
const PRUNE_INTERVAL: usize = 64;

/// Key-value store backing the catalog cache.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Check whether a live entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read the value stored under `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any existing entry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Store `value` only if `key` holds no live entry. Returns whether the write happened.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;
}

/// A stored value with its expiry metadata.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    stored_at: Instant,
    ttl: Duration,
}

impl Entry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            stored_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Process-local cache with per-entry TTL.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired entries every `PRUNE_INTERVAL` writes.
    fn prune(&self, entries: &mut HashMap<String, Entry>) {
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % PRUNE_INTERVAL == 0 {
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired());
            tracing::trace!(pruned = before - entries.len(), "pruned expired entries");
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(|e| !e.is_expired()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.prune(&mut entries);
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.write().await;
        self.prune(&mut entries);
        if entries.get(key).is_some_and(|e| !e.is_expired()) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(true)
    }
}
