//! Configuration error types.

use thiserror::Error;

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors found while validating loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required configuration: CONFAB__{0}")]
    MissingRequired(&'static str),

    #[error("announcement and featured-speaker cache keys must differ")]
    DuplicateCacheKeys,
}
