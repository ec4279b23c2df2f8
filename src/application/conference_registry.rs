//! ConferenceRegistry - conference creation and transactional seat booking.
//!
//! Booking transactions compute an enumerated outcome inside the
//! transaction and translate it to the error taxonomy outside, with an
//! exhaustive `match`. A lost optimistic transaction is surfaced as
//! `Internal` without retry; the seat counter itself is never corrupted
//! because the membership change and the seat change commit together or
//! not at all.

use std::sync::Arc;
use tracing::info;

use crate::domain::conference::{Conference, ConferenceDraft};
use crate::domain::foundation::{
    AuthenticatedUser, ConferenceKey, RegistryError, CONFERENCE_KIND,
};
use crate::ports::{Document, EntityStore, NotificationTask};

use super::profile_service::get_or_create_in_tx;
use super::query_composer::{compose, CompositeQuery};
use super::internal;

/// Outcome of a register transaction, computed inside the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BookingOutcome {
    Booked,
    ConferenceNotFound,
    AlreadyRegistered,
    NoSeatsAvailable,
}

/// Outcome of an unregister transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReleaseOutcome {
    Released,
    ConferenceNotFound,
    NotRegistered,
}

/// Conference creation, lookup, and seat booking.
pub struct ConferenceRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for ConferenceRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore> ConferenceRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a conference under the caller's profile.
    ///
    /// One transaction persists the organizer's profile (created on the
    /// spot if needed) together with the conference, and enqueues the
    /// confirmation notification so it is never dispatched for an aborted
    /// creation.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    /// - `Internal` on store failure
    pub async fn create(
        &self,
        identity: Option<&AuthenticatedUser>,
        draft: ConferenceDraft,
    ) -> Result<Conference, RegistryError> {
        let user = AuthenticatedUser::require(identity)?.clone();
        let organizer = user.profile_key()?;
        let id = self
            .store
            .allocate_id(CONFERENCE_KIND)
            .await
            .map_err(|e| internal("conference id allocation", e))?;
        let key = ConferenceKey::new(organizer, id);

        let conference = self
            .store
            .run_transactional(move |tx| {
                let profile = get_or_create_in_tx(tx, &user)?;
                let conference = Conference::new(&key, profile.display_name(), draft);
                tx.save_all(vec![
                    Document::from_entity(&profile)?,
                    Document::from_entity(&conference)?,
                ])?;
                tx.enqueue(NotificationTask::new(
                    profile.main_email(),
                    conference.to_string(),
                ));
                Ok(conference)
            })
            .await
            .map_err(|e| internal("conference creation", e))?;

        info!(conference = %conference.key(), "conference created");
        Ok(conference)
    }

    /// Books one seat for the caller.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    /// - `Validation` when the key string does not parse
    /// - `NotFound` when the conference does not exist
    /// - `Conflict` on duplicate registration or seat exhaustion
    /// - `Internal` on store failure, including a lost optimistic
    ///   transaction
    pub async fn register(
        &self,
        identity: Option<&AuthenticatedUser>,
        conference_key: &str,
    ) -> Result<(), RegistryError> {
        let user = AuthenticatedUser::require(identity)?.clone();
        let key: ConferenceKey = conference_key.parse()?;

        let tx_key = key.clone();
        let outcome = self
            .store
            .run_transactional(move |tx| {
                let Some(doc) = tx.load(&tx_key.entity_key())? else {
                    return Ok(BookingOutcome::ConferenceNotFound);
                };
                let mut conference: Conference = doc.to_entity()?;
                let mut profile = get_or_create_in_tx(tx, &user)?;

                if profile.is_attending(&tx_key) {
                    return Ok(BookingOutcome::AlreadyRegistered);
                }
                if !conference.book_seats(1) {
                    return Ok(BookingOutcome::NoSeatsAvailable);
                }
                profile.add_conference(tx_key.clone());

                tx.save_all(vec![
                    Document::from_entity(&profile)?,
                    Document::from_entity(&conference)?,
                ])?;
                Ok(BookingOutcome::Booked)
            })
            .await
            .map_err(|e| internal("registration", e))?;

        match outcome {
            BookingOutcome::Booked => {
                info!(conference = %key, "registration booked");
                Ok(())
            }
            BookingOutcome::ConferenceNotFound => Err(RegistryError::not_found(format!(
                "conference {conference_key}"
            ))),
            BookingOutcome::AlreadyRegistered => Err(RegistryError::conflict(
                "already registered for this conference",
            )),
            BookingOutcome::NoSeatsAvailable => {
                Err(RegistryError::conflict("no seats available"))
            }
        }
    }

    /// Releases the caller's seat.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    /// - `Validation` when the key string does not parse
    /// - `NotFound` when the conference does not exist
    /// - `Forbidden` when the caller was not registered
    /// - `Internal` on store failure
    pub async fn unregister(
        &self,
        identity: Option<&AuthenticatedUser>,
        conference_key: &str,
    ) -> Result<(), RegistryError> {
        let user = AuthenticatedUser::require(identity)?.clone();
        let key: ConferenceKey = conference_key.parse()?;

        let tx_key = key.clone();
        let outcome = self
            .store
            .run_transactional(move |tx| {
                let Some(doc) = tx.load(&tx_key.entity_key())? else {
                    return Ok(ReleaseOutcome::ConferenceNotFound);
                };
                let mut conference: Conference = doc.to_entity()?;
                let mut profile = get_or_create_in_tx(tx, &user)?;

                if !profile.remove_conference(&tx_key) {
                    return Ok(ReleaseOutcome::NotRegistered);
                }
                conference.release_seats(1);

                tx.save_all(vec![
                    Document::from_entity(&profile)?,
                    Document::from_entity(&conference)?,
                ])?;
                Ok(ReleaseOutcome::Released)
            })
            .await
            .map_err(|e| internal("unregistration", e))?;

        match outcome {
            ReleaseOutcome::Released => {
                info!(conference = %key, "registration released");
                Ok(())
            }
            ReleaseOutcome::ConferenceNotFound => Err(RegistryError::not_found(format!(
                "conference {conference_key}"
            ))),
            ReleaseOutcome::NotRegistered => Err(RegistryError::forbidden(
                "not registered for this conference",
            )),
        }
    }

    /// All conferences organized by the caller.
    pub async fn list_created_by(
        &self,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<Vec<Conference>, RegistryError> {
        let user = AuthenticatedUser::require(identity)?;
        let ancestor = user.profile_key()?.entity_key();
        let docs = self
            .store
            .query_ancestor(CONFERENCE_KIND, &ancestor, None)
            .await
            .map_err(|e| internal("created-by query", e))?;
        docs.iter()
            .map(|d| d.to_entity())
            .collect::<Result<_, _>>()
            .map_err(|e| internal("conference decode", e))
    }

    /// Loads one conference by its key string.
    ///
    /// # Errors
    ///
    /// - `Validation` when the key string does not parse
    /// - `NotFound` when absent
    pub async fn get(&self, conference_key: &str) -> Result<Conference, RegistryError> {
        let key: ConferenceKey = conference_key.parse()?;
        let doc = self
            .store
            .load(&key.entity_key())
            .await
            .map_err(|e| internal("conference load", e))?
            .ok_or_else(|| RegistryError::not_found(format!("conference {conference_key}")))?;
        doc.to_entity().map_err(|e| internal("conference decode", e))
    }

    /// All conferences the caller holds a seat for, resolved from the
    /// attend-list by batch lookup.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the caller has no profile yet
    pub async fn list_to_attend(
        &self,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<Vec<Conference>, RegistryError> {
        let user = AuthenticatedUser::require(identity)?;
        let key = user.profile_key()?;
        let profile = self
            .store
            .load(&key.entity_key())
            .await
            .map_err(|e| internal("profile load", e))?
            .ok_or_else(|| RegistryError::not_found("profile"))?
            .to_entity::<crate::domain::profile::Profile>()
            .map_err(|e| internal("profile decode", e))?;

        let keys: Vec<_> = profile
            .conferences_to_attend()
            .iter()
            .map(|k| k.entity_key())
            .collect();
        let docs = self
            .store
            .load_many(&keys)
            .await
            .map_err(|e| internal("attend-list lookup", e))?;
        docs.iter()
            .map(|d| d.to_entity())
            .collect::<Result<_, _>>()
            .map_err(|e| internal("conference decode", e))
    }

    /// Composed multi-predicate conference query (e.g. city equality plus a
    /// seats inequality). Result order follows the seed term's result set.
    pub async fn query(&self, query: CompositeQuery) -> Result<Vec<Conference>, RegistryError> {
        let docs = compose(self.store.as_ref(), CONFERENCE_KIND, None, &query)
            .await
            .map_err(|e| internal("conference query", e))?;
        docs.iter()
            .map(|d| d.to_entity())
            .collect::<Result<_, _>>()
            .map_err(|e| internal("conference decode", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEntityStore, InMemoryNotificationQueue};
    use crate::ports::PropertyFilter;

    fn registry() -> (
        ConferenceRegistry<InMemoryEntityStore>,
        Arc<InMemoryNotificationQueue>,
    ) {
        let queue = Arc::new(InMemoryNotificationQueue::new());
        let store = Arc::new(InMemoryEntityStore::new(queue.clone()));
        (ConferenceRegistry::new(store), queue)
    }

    fn organizer() -> AuthenticatedUser {
        AuthenticatedUser::new("org", "organizer@example.com")
    }

    fn attendee() -> AuthenticatedUser {
        AuthenticatedUser::new("att", "attendee@example.com")
    }

    #[tokio::test]
    async fn create_requires_identity() {
        let (registry, _) = registry();
        let err = registry
            .create(None, ConferenceDraft::named("RustConf", 10))
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::Unauthenticated);
    }

    #[tokio::test]
    async fn create_persists_conference_and_notifies_organizer() {
        let (registry, queue) = registry();
        let conference = registry
            .create(Some(&organizer()), ConferenceDraft::named("RustConf", 10))
            .await
            .unwrap();

        assert_eq!(conference.seats_available(), 10);
        assert_eq!(conference.organizer_display_name(), "organizer");

        let sent = queue.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "organizer@example.com");
        assert!(sent[0].payload.contains("Name: RustConf"));

        let loaded = registry.get(&conference.key().to_string()).await.unwrap();
        assert_eq!(loaded, conference);
    }

    #[tokio::test]
    async fn register_books_a_seat_and_records_attendance() {
        let (registry, _) = registry();
        let conference = registry
            .create(Some(&organizer()), ConferenceDraft::named("RustConf", 2))
            .await
            .unwrap();
        let key = conference.key().to_string();

        registry.register(Some(&attendee()), &key).await.unwrap();

        let loaded = registry.get(&key).await.unwrap();
        assert_eq!(loaded.seats_available(), 1);
        let attending = registry.list_to_attend(Some(&attendee())).await.unwrap();
        assert_eq!(attending.len(), 1);
        assert_eq!(attending[0].name(), "RustConf");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_and_books_once() {
        let (registry, _) = registry();
        let conference = registry
            .create(Some(&organizer()), ConferenceDraft::named("RustConf", 5))
            .await
            .unwrap();
        let key = conference.key().to_string();

        registry.register(Some(&attendee()), &key).await.unwrap();
        let err = registry.register(Some(&attendee()), &key).await.unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(_)));
        assert_eq!(registry.get(&key).await.unwrap().seats_available(), 4);
    }

    #[tokio::test]
    async fn register_with_no_seats_conflicts() {
        let (registry, _) = registry();
        let conference = registry
            .create(Some(&organizer()), ConferenceDraft::named("Tiny", 1))
            .await
            .unwrap();
        let key = conference.key().to_string();

        registry.register(Some(&attendee()), &key).await.unwrap();
        let other = AuthenticatedUser::new("att2", "other@example.com");
        let err = registry.register(Some(&other), &key).await.unwrap_err();
        assert_eq!(err, RegistryError::conflict("no seats available"));
        assert_eq!(registry.get(&key).await.unwrap().seats_available(), 0);
    }

    #[tokio::test]
    async fn register_on_missing_conference_is_not_found() {
        let (registry, _) = registry();
        let err = registry
            .register(Some(&attendee()), "Profile:org/Conference:999")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn register_with_bad_key_fails_validation() {
        let (registry, _) = registry();
        let err = registry
            .register(Some(&attendee()), "not-a-key")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation { .. }));
    }

    #[tokio::test]
    async fn unregister_restores_the_seat_and_the_list() {
        let (registry, _) = registry();
        let conference = registry
            .create(Some(&organizer()), ConferenceDraft::named("RustConf", 3))
            .await
            .unwrap();
        let key = conference.key().to_string();

        registry.register(Some(&attendee()), &key).await.unwrap();
        registry.unregister(Some(&attendee()), &key).await.unwrap();

        assert_eq!(registry.get(&key).await.unwrap().seats_available(), 3);
        assert!(registry
            .list_to_attend(Some(&attendee()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unregister_without_registration_is_forbidden() {
        let (registry, _) = registry();
        let conference = registry
            .create(Some(&organizer()), ConferenceDraft::named("RustConf", 3))
            .await
            .unwrap();
        let key = conference.key().to_string();

        let err = registry.unregister(Some(&attendee()), &key).await.unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden(_)));
        assert_eq!(registry.get(&key).await.unwrap().seats_available(), 3);
    }

    #[tokio::test]
    async fn list_created_by_scopes_to_the_organizer() {
        let (registry, _) = registry();
        registry
            .create(Some(&organizer()), ConferenceDraft::named("A", 1))
            .await
            .unwrap();
        registry
            .create(Some(&organizer()), ConferenceDraft::named("B", 1))
            .await
            .unwrap();
        registry
            .create(Some(&attendee()), ConferenceDraft::named("C", 1))
            .await
            .unwrap();

        let created = registry.list_created_by(Some(&organizer())).await.unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|c| c.organizer_user_id() == "org"));
    }

    #[tokio::test]
    async fn list_to_attend_without_profile_is_not_found() {
        let (registry, _) = registry();
        let err = registry.list_to_attend(Some(&attendee())).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn composed_query_filters_city_and_seats() {
        let (registry, _) = registry();
        let mut draft = ConferenceDraft::named("In town", 5);
        draft.city = Some("London".to_string());
        registry.create(Some(&organizer()), draft).await.unwrap();

        let mut draft = ConferenceDraft::named("Elsewhere", 5);
        draft.city = Some("Paris".to_string());
        registry.create(Some(&organizer()), draft).await.unwrap();

        let mut draft = ConferenceDraft::named("Full house", 0);
        draft.city = Some("London".to_string());
        registry.create(Some(&organizer()), draft).await.unwrap();

        let query = CompositeQuery::new()
            .matching(PropertyFilter::gt("seats_available", 0))
            .matching(PropertyFilter::eq("city", "London"));
        let results = registry.query(query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "In town");
    }
}
