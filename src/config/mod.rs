//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `CONFAB` prefix
//! and `__` (double underscore) separating nested sections.

mod cache;
mod error;

pub use cache::CacheConfig;
pub use error::{ConfigError, ValidationError};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Cache slot names (announcement, featured speaker).
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file if present, then reads `CONFAB`-prefixed
    /// variables, e.g. `CONFAB__CACHE__ANNOUNCEMENT_KEY=ANNOUNCEMENTS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` when the environment source cannot be
    /// read or deserialized.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CONFAB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.cache.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
