//! Cache slot configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Names of the two well-known cache slots.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Slot holding the site-wide announcement text.
    #[serde(default = "default_announcement_key")]
    pub announcement_key: String,

    /// Slot holding the featured-speaker summary text.
    #[serde(default = "default_featured_speaker_key")]
    pub featured_speaker_key: String,
}

impl CacheConfig {
    /// Validate cache configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.announcement_key.is_empty() {
            return Err(ValidationError::MissingRequired("CACHE__ANNOUNCEMENT_KEY"));
        }
        if self.featured_speaker_key.is_empty() {
            return Err(ValidationError::MissingRequired(
                "CACHE__FEATURED_SPEAKER_KEY",
            ));
        }
        if self.announcement_key == self.featured_speaker_key {
            return Err(ValidationError::DuplicateCacheKeys);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            announcement_key: default_announcement_key(),
            featured_speaker_key: default_featured_speaker_key(),
        }
    }
}

fn default_announcement_key() -> String {
    "RECENT_ANNOUNCEMENTS".to_string()
}

fn default_featured_speaker_key() -> String {
    "FEATURED_SPEAKER".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_both_slots() {
        let config = CacheConfig::default();
        assert_eq!(config.announcement_key, "RECENT_ANNOUNCEMENTS");
        assert_eq!(config.featured_speaker_key, "FEATURED_SPEAKER");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn identical_slot_names_are_rejected() {
        let config = CacheConfig {
            announcement_key: "SLOT".to_string(),
            featured_speaker_key: "SLOT".to_string(),
        };
        assert_eq!(config.validate(), Err(ValidationError::DuplicateCacheKeys));
    }
}
