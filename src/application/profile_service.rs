//! ProfileService - attendee profile access and updates.

use std::sync::Arc;
use tracing::info;

use crate::domain::foundation::{AuthenticatedUser, RegistryError};
use crate::domain::profile::{Profile, ShirtSize};
use crate::ports::{Document, EntityStore, StoreError, TransactionHandle};

use super::internal;

/// Profile access for the current identity.
///
/// Profiles are constructed lazily: a pure read for an identity with no
/// stored profile returns a fresh in-memory profile without persisting it,
/// so reads never cost a write.
pub struct ProfileService<S> {
    store: Arc<S>,
}

impl<S> Clone for ProfileService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> ProfileService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Loads the stored profile for this identity, `Ok(None)` when none
    /// exists yet.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    pub async fn get(
        &self,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<Option<Profile>, RegistryError> {
        let user = AuthenticatedUser::require(identity)?;
        let key = user.profile_key()?;
        let doc = self
            .store
            .load(&key.entity_key())
            .await
            .map_err(|e| internal("profile load", e))?;
        doc.map(|d| d.to_entity())
            .transpose()
            .map_err(|e| internal("profile decode", e))
    }

    /// Loads the profile or constructs a default one without persisting it.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    pub async fn get_or_create(
        &self,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<Profile, RegistryError> {
        let user = AuthenticatedUser::require(identity)?;
        match self.get(Some(user)).await? {
            Some(profile) => Ok(profile),
            None => Ok(default_profile(user)?),
        }
    }

    /// Creates or updates the profile and persists it.
    ///
    /// On first save, an absent display name falls back to the email local
    /// part and an absent shirt size to `Unspecified`. On later saves only
    /// the provided fields overwrite.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    pub async fn save(
        &self,
        identity: Option<&AuthenticatedUser>,
        display_name: Option<String>,
        shirt_size: Option<ShirtSize>,
    ) -> Result<Profile, RegistryError> {
        let user = AuthenticatedUser::require(identity)?;

        let profile = match self.get(Some(user)).await? {
            Some(mut existing) => {
                existing.update(display_name, shirt_size);
                existing
            }
            None => Profile::new(
                &user.profile_key()?,
                display_name.unwrap_or_else(|| user.default_display_name()),
                &user.email,
                shirt_size.unwrap_or_default(),
            ),
        };

        let doc = Document::from_entity(&profile).map_err(|e| internal("profile encode", e))?;
        self.store
            .save_all(vec![doc])
            .await
            .map_err(|e| internal("profile save", e))?;
        info!(user_id = %user.user_id, "profile saved");
        Ok(profile)
    }
}

/// Builds the lazily-constructed default profile for an identity.
fn default_profile(user: &AuthenticatedUser) -> Result<Profile, RegistryError> {
    Ok(Profile::new(
        &user.profile_key()?,
        user.default_display_name(),
        &user.email,
        ShirtSize::Unspecified,
    ))
}

/// Transaction-scoped get-or-create, for use inside booking transactions:
/// loads the profile through the handle's snapshot or constructs the same
/// default the async path would.
pub(crate) fn get_or_create_in_tx(
    tx: &mut dyn TransactionHandle,
    user: &AuthenticatedUser,
) -> Result<Profile, StoreError> {
    let key = user
        .profile_key()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    match tx.load(&key.entity_key())? {
        Some(doc) => doc.to_entity(),
        None => Ok(Profile::new(
            &key,
            user.default_display_name(),
            &user.email,
            ShirtSize::Unspecified,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEntityStore, InMemoryNotificationQueue};

    fn service() -> ProfileService<InMemoryEntityStore> {
        let store = Arc::new(InMemoryEntityStore::new(Arc::new(
            InMemoryNotificationQueue::new(),
        )));
        ProfileService::new(store)
    }

    fn identity() -> AuthenticatedUser {
        AuthenticatedUser::new("u1", "lemoncake@example.com")
    }

    #[tokio::test]
    async fn operations_require_an_identity() {
        let service = service();
        assert_eq!(
            service.get(None).await.unwrap_err(),
            RegistryError::Unauthenticated
        );
        assert_eq!(
            service.save(None, None, None).await.unwrap_err(),
            RegistryError::Unauthenticated
        );
    }

    #[tokio::test]
    async fn get_returns_none_before_first_save() {
        let service = service();
        assert!(service.get(Some(&identity())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_or_create_does_not_persist() {
        let service = service();
        let profile = service.get_or_create(Some(&identity())).await.unwrap();
        assert_eq!(profile.display_name(), "lemoncake");
        assert_eq!(profile.shirt_size(), ShirtSize::Unspecified);
        // Still a pure read: nothing stored.
        assert!(service.get(Some(&identity())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn first_save_applies_defaults_for_absent_fields() {
        let service = service();
        let profile = service
            .save(Some(&identity()), None, Some(ShirtSize::M))
            .await
            .unwrap();
        assert_eq!(profile.display_name(), "lemoncake");
        assert_eq!(profile.shirt_size(), ShirtSize::M);
        assert_eq!(profile.main_email(), "lemoncake@example.com");

        let stored = service.get(Some(&identity())).await.unwrap().unwrap();
        assert_eq!(stored, profile);
    }

    #[tokio::test]
    async fn later_save_overwrites_only_provided_fields() {
        let service = service();
        service
            .save(Some(&identity()), Some("cake".to_string()), Some(ShirtSize::L))
            .await
            .unwrap();
        let updated = service
            .save(Some(&identity()), None, Some(ShirtSize::S))
            .await
            .unwrap();
        assert_eq!(updated.display_name(), "cake");
        assert_eq!(updated.shirt_size(), ShirtSize::S);
    }
}
