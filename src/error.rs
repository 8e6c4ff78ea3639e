// Error types for the catalog cache.
// Covers upstream, cache store, decoding and configuration failures.

use thiserror::Error;

/// Coarse classification of an [`Error`], used by callers to decide what to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No data at this key or resource.
    NotFound,
    /// Decode failure or unexpected I/O failure.
    Internal,
    /// A populate was skipped because data was already cached.
    CacheKeyExists,
    /// Malformed page or id parameter.
    BadInput,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Cache exists, not writing to cache: {0}")]
    CacheKeyExists(String),

    #[error("Bad request param: {0}")]
    BadInput(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache store error: {0}")]
    Store(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::CacheKeyExists(_) => ErrorKind::CacheKeyExists,
            Error::BadInput(_) => ErrorKind::BadInput,
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_cache_key_exists(&self) -> bool {
        self.kind() == ErrorKind::CacheKeyExists
    }
}

pub type Result<T> = std::result::Result<T, Error>;
