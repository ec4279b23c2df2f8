//! Error taxonomy for the registry and catalog services.

use thiserror::Error;

use super::KeyError;

/// Caller-facing failure of any registry or catalog operation.
///
/// Transaction bodies report enumerated outcome codes; the owning service
/// translates those to this taxonomy with an exhaustive `match`, so the
/// mapping never depends on reason-string contents. Unexpected store or
/// cache failures become [`RegistryError::Internal`] and are logged where
/// they are caught, keeping them distinguishable from the expected
/// not-found / conflict / forbidden outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No authenticated identity was supplied.
    #[error("authorization required")]
    Unauthenticated,

    /// A referenced Profile, Conference, or Session does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate registration, duplicate wishlist entry, or seat exhaustion.
    #[error("{0}")]
    Conflict(String),

    /// Removal of a membership that was never established.
    #[error("{0}")]
    Forbidden(String),

    /// Input rejected before any persistence was attempted.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Unexpected store or cache failure, including a lost optimistic
    /// transaction. Never retried here.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        RegistryError::NotFound(what.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        RegistryError::Conflict(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        RegistryError::Forbidden(reason.into())
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistryError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        RegistryError::Internal(detail.into())
    }
}

impl From<KeyError> for RegistryError {
    fn from(err: KeyError) -> Self {
        RegistryError::validation("key", err.to_string())
    }
}
