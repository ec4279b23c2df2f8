//! End-to-end seat booking through the registry, wired to the in-memory
//! adapters the way the binary would wire real ones.

use std::sync::Arc;

use proptest::prelude::*;

use confab::adapters::memory::{InMemoryEntityStore, InMemoryNotificationQueue};
use confab::application::{ConferenceRegistry, ProfileService};
use confab::domain::conference::ConferenceDraft;
use confab::domain::foundation::{AuthenticatedUser, RegistryError};

fn store() -> Arc<InMemoryEntityStore> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Arc::new(InMemoryEntityStore::new(Arc::new(
        InMemoryNotificationQueue::new(),
    )))
}

fn organizer() -> AuthenticatedUser {
    AuthenticatedUser::new("org", "organizer@example.com")
}

#[tokio::test]
async fn booking_is_visible_through_the_profile_service() {
    let store = store();
    let registry = ConferenceRegistry::new(store.clone());
    let profiles = ProfileService::new(store);

    let conference = registry
        .create(Some(&organizer()), ConferenceDraft::named("RustConf", 3))
        .await
        .unwrap();
    let key = conference.key().to_string();

    let attendee = AuthenticatedUser::new("att", "ada.lovelace@example.com");
    registry.register(Some(&attendee), &key).await.unwrap();

    // The booking transaction persisted the lazily-created profile.
    let profile = profiles.get(Some(&attendee)).await.unwrap().unwrap();
    assert_eq!(profile.display_name(), "ada.lovelace");
    assert_eq!(profile.conferences_to_attend().len(), 1);
    assert_eq!(
        profile.conferences_to_attend()[0].to_string(),
        key
    );

    registry.unregister(Some(&attendee), &key).await.unwrap();
    assert_eq!(registry.get(&key).await.unwrap().seats_available(), 3);
    let profile = profiles.get(Some(&attendee)).await.unwrap().unwrap();
    assert!(profile.conferences_to_attend().is_empty());
}

#[tokio::test]
async fn exhausted_conference_frees_up_after_an_unregister() {
    let registry = ConferenceRegistry::new(store());
    let conference = registry
        .create(Some(&organizer()), ConferenceDraft::named("Tiny", 2))
        .await
        .unwrap();
    let key = conference.key().to_string();

    let first = AuthenticatedUser::new("a1", "a1@example.com");
    let second = AuthenticatedUser::new("a2", "a2@example.com");
    let third = AuthenticatedUser::new("a3", "a3@example.com");

    registry.register(Some(&first), &key).await.unwrap();
    registry.register(Some(&second), &key).await.unwrap();
    let err = registry.register(Some(&third), &key).await.unwrap_err();
    assert_eq!(err, RegistryError::conflict("no seats available"));
    assert_eq!(registry.get(&key).await.unwrap().seats_available(), 0);

    registry.unregister(Some(&first), &key).await.unwrap();
    registry.register(Some(&third), &key).await.unwrap();
    assert_eq!(registry.get(&key).await.unwrap().seats_available(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_book_the_last_seat_exactly_once() {
    let registry = ConferenceRegistry::new(store());
    let conference = registry
        .create(Some(&organizer()), ConferenceDraft::named("One seat", 1))
        .await
        .unwrap();
    let key = conference.key().to_string();

    let mut handles = Vec::new();
    for i in 0..4 {
        let registry = registry.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            let user = AuthenticatedUser::new(format!("u{i}"), format!("u{i}@example.com"));
            registry.register(Some(&user), &key).await
        }));
    }

    let mut booked = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => booked += 1,
            // A loser either saw zero seats or lost the optimistic
            // transaction outright.
            Err(RegistryError::Conflict(_)) | Err(RegistryError::Internal(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(booked, 1);
    assert_eq!(registry.get(&key).await.unwrap().seats_available(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Under any interleaving of register/unregister attempts the seat
    /// counter stays within `[0, max_attendees]` and equals the seats the
    /// current attendee set has not taken.
    #[test]
    fn seat_counter_tracks_the_attendee_set(
        ops in proptest::collection::vec((0u8..4, any::<bool>()), 0..24),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let registry = ConferenceRegistry::new(store());
            let max = 2u32;
            let conference = registry
                .create(Some(&organizer()), ConferenceDraft::named("Prop", max))
                .await
                .unwrap();
            let key = conference.key().to_string();

            let mut attending = std::collections::HashSet::new();
            for (user, register) in ops {
                let identity =
                    AuthenticatedUser::new(format!("u{user}"), format!("u{user}@example.com"));
                if register {
                    match registry.register(Some(&identity), &key).await {
                        Ok(()) => {
                            assert!(attending.insert(user));
                        }
                        Err(RegistryError::Conflict(_)) => {
                            assert!(
                                attending.contains(&user)
                                    || attending.len() as u32 == max
                            );
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                } else {
                    match registry.unregister(Some(&identity), &key).await {
                        Ok(()) => {
                            assert!(attending.remove(&user));
                        }
                        Err(RegistryError::Forbidden(_)) => {
                            assert!(!attending.contains(&user));
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }

                let seats = registry.get(&key).await.unwrap().seats_available();
                assert!(seats <= max);
                assert_eq!(seats, max - attending.len() as u32);
            }
        });
    }
}
