//! Cache port: key/value side-cache.
//!
//! No read-time population, no TTL, no eviction contract. Values persist
//! until explicitly overwritten, and readers must treat an absent value as
//! "never written", not as an error.

use async_trait::async_trait;
use thiserror::Error;

/// Failures surfaced by the cache backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache backend failure: {0}")]
    Backend(String),
}

/// Side-cache contract.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Reads a slot. `Ok(None)` means the slot was never written (or was
    /// evicted, which callers cannot distinguish).
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Overwrites a slot unconditionally.
    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError>;
}
