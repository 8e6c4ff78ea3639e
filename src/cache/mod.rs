// Cache module for the key-value store in front of the catalog.
// Defines the store capability, its implementations, and the key namespace.

pub mod keys;
pub mod redis_store;
pub mod store;

pub use keys::{DEFAULT_PAGE_SIZE, item_key, normalize_page, page_key, page_offset};
pub use redis_store::RedisCache;
pub use store::{Cache, DEFAULT_TTL, MemoryCache};
