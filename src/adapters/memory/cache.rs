//! In-Memory Cache Adapter
//!
//! Plain map behind a read/write lock. Never evicts, never expires,
//! matching the (absent) guarantees of the cache port.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{Cache, CacheError};

/// In-memory cache for announcements and the featured-speaker slot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all slots (useful for tests).
    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unwritten_slot_reads_as_absent() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("announcement").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites_unconditionally() {
        let cache = InMemoryCache::new();
        cache.put("slot", "first").await.unwrap();
        cache.put("slot", "second").await.unwrap();
        assert_eq!(cache.get("slot").await.unwrap().as_deref(), Some("second"));
    }
}
