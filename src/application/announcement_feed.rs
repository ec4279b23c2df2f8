//! AnnouncementFeed - the two well-known cache slots.
//!
//! The site announcement is written by an external cron; the
//! featured-speaker summary by [`super::SessionCatalog`]. Both are plain
//! cache values with no expiry: absent means "never written", not an
//! error, and readers must tolerate staleness under concurrent writes.

use std::sync::Arc;
use tracing::warn;

use crate::config::CacheConfig;
use crate::domain::foundation::RegistryError;
use crate::ports::{Cache, CacheError};

/// Read/write access to the announcement and featured-speaker slots.
#[derive(Clone)]
pub struct AnnouncementFeed {
    cache: Arc<dyn Cache>,
    config: CacheConfig,
}

impl AnnouncementFeed {
    pub fn new(cache: Arc<dyn Cache>, config: CacheConfig) -> Self {
        Self { cache, config }
    }

    /// The current site-wide announcement, if one was ever written.
    pub async fn announcement(&self) -> Result<Option<String>, RegistryError> {
        self.read(&self.config.announcement_key).await
    }

    /// The current featured-speaker summary, if one was ever computed.
    pub async fn featured_speaker(&self) -> Result<Option<String>, RegistryError> {
        self.read(&self.config.featured_speaker_key).await
    }

    /// Overwrites the announcement slot.
    pub async fn set_announcement(&self, text: &str) -> Result<(), RegistryError> {
        self.cache
            .put(&self.config.announcement_key, text)
            .await
            .map_err(cache_internal)
    }

    /// Overwrites the featured-speaker slot. Best-effort at the call sites:
    /// the catalog logs and continues when this fails.
    pub async fn set_featured_speaker(&self, text: &str) -> Result<(), RegistryError> {
        self.cache
            .put(&self.config.featured_speaker_key, text)
            .await
            .map_err(cache_internal)
    }

    async fn read(&self, slot: &str) -> Result<Option<String>, RegistryError> {
        self.cache.get(slot).await.map_err(cache_internal)
    }
}

fn cache_internal(err: CacheError) -> RegistryError {
    warn!(error = %err, "cache access failed");
    RegistryError::internal(err.to_string())
}
