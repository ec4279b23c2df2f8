//! Authenticated identity as resolved by the (out-of-scope) identity layer.

use serde::{Deserialize, Serialize};

use super::{ProfileKey, RegistryError};

/// The identity attached to a request.
///
/// Token validation happens upstream; by the time a service sees this value
/// the identity is trusted. Operations that require sign-in take an
/// `Option<&AuthenticatedUser>` and fail `Unauthenticated` on `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Stable, opaque id from the identity provider.
    pub user_id: String,

    /// Primary email address.
    pub email: String,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    /// The profile key this identity maps to.
    pub fn profile_key(&self) -> Result<ProfileKey, RegistryError> {
        ProfileKey::new(&self.user_id).map_err(RegistryError::from)
    }

    /// Display name fallback: the local part of the email address.
    pub fn default_display_name(&self) -> String {
        match self.email.split_once('@') {
            Some((local, _)) => local.to_string(),
            None => self.email.clone(),
        }
    }

    /// Unwraps an optional identity, failing `Unauthenticated` on `None`.
    pub fn require(identity: Option<&AuthenticatedUser>) -> Result<&AuthenticatedUser, RegistryError> {
        identity.ok_or(RegistryError::Unauthenticated)
    }
}
