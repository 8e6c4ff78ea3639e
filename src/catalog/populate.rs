// Cache population from the upstream catalog.
// Fetches pages and items and writes them only where no live entry exists.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::cache::{Cache, DEFAULT_PAGE_SIZE, DEFAULT_TTL, item_key, page_key, page_offset};
use crate::error::{Error, Result};
use crate::upstream::CatalogClient;

use super::types::{Item, PageIds};

/// Default number of item writes in flight during a page populate.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Fills the cache for a page or a single item.
///
/// `Err(Error::CacheKeyExists(_))` is informational: data was already cached
/// and nothing needs fixing.
#[async_trait]
pub trait Populate: Send + Sync {
    async fn populate_page(&self, page: i64) -> Result<()>;

    async fn populate_item(&self, id: u64) -> Result<()>;
}

/// Tuning for [`Populator`].
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    /// TTL applied to every written entry.
    pub ttl: Duration,
    /// Items requested per upstream page.
    pub page_size: u32,
    /// Maximum concurrent item writes per page.
    pub batch_size: usize,
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl PopulateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Outcome counts of a warm-up run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupReport {
    pub populated: usize,
    pub already_cached: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Population engine backed by the upstream client and a cache store.
pub struct Populator<C: Cache + ?Sized> {
    client: CatalogClient,
    cache: Arc<C>,
    options: PopulateOptions,
}

impl<C: Cache + ?Sized> Populator<C> {
    pub fn new(client: CatalogClient, cache: Arc<C>, options: PopulateOptions) -> Self {
        let options = PopulateOptions {
            page_size: options.page_size.max(1),
            batch_size: options.batch_size.max(1),
            ..options
        };
        Self {
            client,
            cache,
            options,
        }
    }

    pub fn options(&self) -> &PopulateOptions {
        &self.options
    }

    /// Populate pages `1..=last_page` one after another.
    ///
    /// Page 0 is skipped: it normalizes to the same offset and key as page 1.
    pub async fn warm(&self, last_page: i64) -> WarmupReport {
        let mut report = WarmupReport::default();

        for page in 1..=last_page {
            match self.populate_page(page).await {
                Ok(()) => report.populated += 1,
                Err(err) if err.is_cache_key_exists() => {
                    tracing::debug!(page, "page already cached");
                    report.already_cached += 1;
                }
                Err(err) if err.is_not_found() => {
                    tracing::debug!(page, "page not found upstream");
                    report.not_found += 1;
                }
                Err(err) => {
                    tracing::error!(page, error = %err, "failed to warm page");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Write `value` under `key` unless a live entry is already there.
    async fn store_if_absent(&self, key: &str, value: &str) -> Result<()> {
        if self.cache.exists(key).await? {
            return Err(Error::CacheKeyExists(key.to_string()));
        }
        // Conditional write closes the gap between the check and the set.
        if !self.cache.set_if_absent(key, value, self.options.ttl).await? {
            return Err(Error::CacheKeyExists(key.to_string()));
        }
        Ok(())
    }

    async fn store_item(&self, item: Item) -> Result<()> {
        let key = item_key(item.id);
        let value = serde_json::to_string(&item.stamped())?;
        self.store_if_absent(&key, &value).await
    }

    /// Write items in batches of at most `batch_size`, draining each batch before
    /// starting the next. A failing write does not cancel its peers.
    async fn store_items(&self, items: Vec<Item>) -> Result<()> {
        let total = items.len();
        let mut skipped = 0;
        let mut first_error = None;

        for batch in items.chunks(self.options.batch_size) {
            let writes = batch.iter().cloned().map(|item| {
                let id = item.id;
                async move { (id, self.store_item(item).await) }
            });

            for (id, outcome) in join_all(writes).await {
                match outcome {
                    Ok(()) => {}
                    Err(err) if err.is_cache_key_exists() => skipped += 1,
                    Err(err) => {
                        tracing::warn!(id, error = %err, "failed to cache item");
                        first_error.get_or_insert(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        if skipped > 0 {
            return Err(Error::CacheKeyExists(format!(
                "{} of {} items already cached",
                skipped, total
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Cache + ?Sized> Populate for Populator<C> {
    async fn populate_page(&self, page: i64) -> Result<()> {
        let offset = page_offset(page, self.options.page_size);
        let items = self
            .client
            .fetch_page(offset, self.options.page_size)
            .await?;

        let ids: PageIds = items.iter().map(|item| item.id).collect();
        let key = page_key(page);
        let value = serde_json::to_string(&ids)?;
        self.store_if_absent(&key, &value).await?;
        tracing::debug!(page, key = %key, items = ids.len(), "cached page");

        self.store_items(items).await
    }

    async fn populate_item(&self, id: u64) -> Result<()> {
        let item = self.client.fetch_item(id).await?;
        self.store_item(item).await?;
        tracing::debug!(id, "cached item");
        Ok(())
    }
}
