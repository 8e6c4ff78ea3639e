// Read-through coordinator.
// Serves reads from the cache and refills it in detached background tasks.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

use crate::cache::{Cache, item_key, page_key};
use crate::error::{Error, Result};

use super::populate::Populate;
use super::types::{Item, PageIds};

/// Configuration for the read-through coordinator.
#[derive(Debug, Clone)]
pub struct ReadThroughOptions {
    /// Deadline for a reader's cache lookup.
    pub read_timeout: Duration,
    /// Deadline for a detached populate, independent of the reader.
    pub populate_timeout: Duration,
    /// Maximum number of populates talking to upstream at once.
    pub max_in_flight: usize,
    /// Populates allowed to wait for a running slot. Beyond this, new ones are dropped.
    pub max_queue: usize,
}

impl Default for ReadThroughOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(2),
            populate_timeout: Duration::from_secs(30),
            max_in_flight: 64,
            max_queue: 1024,
        }
    }
}

impl ReadThroughOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_populate_timeout(mut self, timeout: Duration) -> Self {
        self.populate_timeout = timeout;
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max;
        self
    }

    pub fn with_max_queue(mut self, max: usize) -> Self {
        self.max_queue = max;
        self
    }
}

/// What a detached populate should fill.
#[derive(Debug, Clone, Copy)]
enum Target {
    Page(i64),
    Item(u64),
}

impl Target {
    async fn populate<P: Populate + ?Sized>(self, populator: &P) -> Result<()> {
        match self {
            Target::Page(page) => populator.populate_page(page).await,
            Target::Item(id) => populator.populate_item(id).await,
        }
    }
}

/// Serves catalog reads from the cache.
///
/// Every read schedules one populate for the same page or item and returns without
/// waiting for it. A populate never fails a read: its outcome is only logged.
/// At most `max_in_flight + max_queue` populates are admitted at a time; when all
/// slots are taken the populate is dropped and the cache fills on a later read.
pub struct ReadThrough<C: Cache + ?Sized, P: Populate + ?Sized> {
    cache: Arc<C>,
    populator: Arc<P>,
    options: ReadThroughOptions,
    tasks: TaskTracker,
    /// Admitted populates, running or waiting.
    slots: Arc<Semaphore>,
    /// Running populates.
    permits: Arc<Semaphore>,
}

impl<C, P> ReadThrough<C, P>
where
    C: Cache + ?Sized,
    P: Populate + ?Sized + 'static,
{
    pub fn new(cache: Arc<C>, populator: Arc<P>, options: ReadThroughOptions) -> Self {
        let max_in_flight = options.max_in_flight.clamp(1, Semaphore::MAX_PERMITS);
        let admitted = max_in_flight
            .saturating_add(options.max_queue)
            .min(Semaphore::MAX_PERMITS);
        let slots = Arc::new(Semaphore::new(admitted));
        let permits = Arc::new(Semaphore::new(max_in_flight));
        Self {
            cache,
            populator,
            options,
            tasks: TaskTracker::new(),
            slots,
            permits,
        }
    }

    /// Ordered item ids of `page`.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, page: i64) -> Result<PageIds> {
        self.spawn_populate(Target::Page(page));

        let key = page_key(page);
        let ids: PageIds = self.read(&key).await?;
        if ids.is_empty() {
            return Err(Error::NotFound(key));
        }
        Ok(ids)
    }

    /// A single item by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: u64) -> Result<Item> {
        self.spawn_populate(Target::Item(id));
        self.read(&item_key(id)).await
    }

    /// Number of detached populates not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Stop accepting populates and wait for the outstanding ones.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Cache lookup bounded by the reader's deadline.
    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        tokio::time::timeout(self.options.read_timeout, self.lookup(key))
            .await
            .map_err(|_| Error::Timeout(format!("cache read of {}", key)))?
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        match self.cache.get(key).await? {
            Some(value) if !value.is_empty() => Ok(serde_json::from_str(&value)?),
            _ => Err(Error::NotFound(key.to_string())),
        }
    }

    fn spawn_populate(&self, target: Target) {
        if self.tasks.is_closed() {
            tracing::debug!(?target, "shutting down, populate not started");
            return;
        }

        let Ok(slot) = Arc::clone(&self.slots).try_acquire_owned() else {
            tracing::error!(?target, "populate queue full, populate dropped");
            return;
        };

        let populator = Arc::clone(&self.populator);
        let permits = Arc::clone(&self.permits);
        let timeout = self.options.populate_timeout;

        self.tasks.spawn(async move {
            let _slot = slot;
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };

            let outcome = tokio::time::timeout(timeout, target.populate(&*populator))
                .await
                .unwrap_or_else(|_| Err(Error::Timeout(format!("populate of {:?}", target))));

            match outcome {
                Ok(()) => tracing::debug!(?target, "populate finished"),
                Err(err) if err.is_cache_key_exists() => {
                    tracing::debug!(?target, "populate skipped, already cached")
                }
                Err(err) => tracing::error!(?target, error = %err, "populate failed"),
            }
        });
    }
}
