//! SessionCatalog - sessions, wishlists, and the featured-speaker summary.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::foundation::{
    AuthenticatedUser, ConferenceKey, RegistryError, SessionKey, SESSION_KIND,
};
use crate::domain::session::{Session, SessionDraft};
use crate::ports::{Document, EntityStore, PropertyFilter};

use super::announcement_feed::AnnouncementFeed;
use super::profile_service::get_or_create_in_tx;
use super::query_composer::{compose, CompositeQuery};
use super::internal;

/// Outcome of a wishlist-add transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WishlistAddOutcome {
    Added,
    SessionNotFound,
    AlreadyInWishlist,
}

/// Outcome of a wishlist-remove transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WishlistRemoveOutcome {
    Removed,
    SessionNotFound,
    NotInWishlist,
}

/// Session creation, catalog queries, and per-attendee wishlists.
pub struct SessionCatalog<S> {
    store: Arc<S>,
    feed: AnnouncementFeed,
}

impl<S> Clone for SessionCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            feed: self.feed.clone(),
        }
    }
}

impl<S: EntityStore> SessionCatalog<S> {
    pub fn new(store: Arc<S>, feed: AnnouncementFeed) -> Self {
        Self { store, feed }
    }

    /// Creates a session under a conference.
    ///
    /// After the save, the featured-speaker summary is recomputed
    /// best-effort: when the speaker now has two or more sessions under the
    /// conference, the cache slot is overwritten with
    /// `"<speaker>: <session names, comma-separated>"`. The recomputation
    /// is not transactional with the save; readers may briefly observe the
    /// new session with a stale summary.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    /// - `Validation` when the key string does not parse or the draft has
    ///   no name (checked before any persistence)
    /// - `Internal` on store failure
    pub async fn create(
        &self,
        identity: Option<&AuthenticatedUser>,
        conference_key: &str,
        draft: SessionDraft,
    ) -> Result<Session, RegistryError> {
        AuthenticatedUser::require(identity)?;
        let conference: ConferenceKey = conference_key.parse()?;

        let id = self
            .store
            .allocate_id(SESSION_KIND)
            .await
            .map_err(|e| internal("session id allocation", e))?;
        let key = SessionKey::new(conference, id);
        let session = Session::new(&key, draft)?;

        let doc = Document::from_entity(&session).map_err(|e| internal("session encode", e))?;
        self.store
            .save_all(vec![doc])
            .await
            .map_err(|e| internal("session save", e))?;
        info!(session = %key, speaker = session.speaker(), "session created");

        self.recompute_featured_speaker(&session).await;
        Ok(session)
    }

    /// Re-applies the shared field-assignment routine to an existing
    /// session, so updates normalize exactly like creation.
    ///
    /// # Errors
    ///
    /// - `Validation` on a bad key string or a nameless draft
    /// - `NotFound` when the session does not exist
    pub async fn update(
        &self,
        session_key: &str,
        draft: SessionDraft,
    ) -> Result<Session, RegistryError> {
        let key: SessionKey = session_key.parse()?;
        let doc = self
            .store
            .load(&key.entity_key())
            .await
            .map_err(|e| internal("session load", e))?
            .ok_or_else(|| RegistryError::not_found(format!("session {session_key}")))?;
        let mut session: Session = doc
            .to_entity()
            .map_err(|e| internal("session decode", e))?;

        session.apply_draft(draft)?;

        let doc = Document::from_entity(&session).map_err(|e| internal("session encode", e))?;
        self.store
            .save_all(vec![doc])
            .await
            .map_err(|e| internal("session save", e))?;
        Ok(session)
    }

    /// All sessions under a conference, ordered by name.
    pub async fn list_by_conference(
        &self,
        conference_key: &str,
    ) -> Result<Vec<Session>, RegistryError> {
        let key: ConferenceKey = conference_key.parse()?;
        let docs = self
            .store
            .query_ancestor(SESSION_KIND, &key.entity_key(), Some("name"))
            .await
            .map_err(|e| internal("conference sessions query", e))?;
        decode_sessions(&docs)
    }

    /// Sessions of one type under a conference, ordered by name.
    pub async fn list_by_conference_and_type(
        &self,
        conference_key: &str,
        type_of_session: &str,
    ) -> Result<Vec<Session>, RegistryError> {
        let key: ConferenceKey = conference_key.parse()?;
        let docs = self
            .store
            .query(
                SESSION_KIND,
                Some(&key.entity_key()),
                &[PropertyFilter::eq("type_of_session", type_of_session)],
                Some("name"),
            )
            .await
            .map_err(|e| internal("typed sessions query", e))?;
        decode_sessions(&docs)
    }

    /// All sessions by a speaker, across every conference.
    pub async fn list_by_speaker(&self, speaker: &str) -> Result<Vec<Session>, RegistryError> {
        let docs = self
            .store
            .query(
                SESSION_KIND,
                None,
                &[PropertyFilter::eq("speaker", speaker)],
                None,
            )
            .await
            .map_err(|e| internal("speaker sessions query", e))?;
        decode_sessions(&docs)
    }

    /// Adds a session to the caller's wishlist.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without an identity
    /// - `Validation` on a bad key string
    /// - `NotFound` when the session does not exist
    /// - `Conflict` when the session is already wishlisted
    /// - `Internal` on store failure
    pub async fn add_to_wishlist(
        &self,
        identity: Option<&AuthenticatedUser>,
        session_key: &str,
    ) -> Result<(), RegistryError> {
        let user = AuthenticatedUser::require(identity)?.clone();
        let key: SessionKey = session_key.parse()?;

        let tx_key = key.clone();
        let outcome = self
            .store
            .run_transactional(move |tx| {
                if tx.load(&tx_key.entity_key())?.is_none() {
                    return Ok(WishlistAddOutcome::SessionNotFound);
                }
                let mut profile = get_or_create_in_tx(tx, &user)?;
                if !profile.add_to_wishlist(tx_key.clone()) {
                    return Ok(WishlistAddOutcome::AlreadyInWishlist);
                }
                tx.save(Document::from_entity(&profile)?)?;
                Ok(WishlistAddOutcome::Added)
            })
            .await
            .map_err(|e| internal("wishlist add", e))?;

        match outcome {
            WishlistAddOutcome::Added => {
                info!(session = %key, "session wishlisted");
                Ok(())
            }
            WishlistAddOutcome::SessionNotFound => {
                Err(RegistryError::not_found(format!("session {session_key}")))
            }
            WishlistAddOutcome::AlreadyInWishlist => {
                Err(RegistryError::conflict("already in wishlist"))
            }
        }
    }

    /// Removes a session from the caller's wishlist.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the session does not exist
    /// - `Forbidden` when the session was never wishlisted
    pub async fn remove_from_wishlist(
        &self,
        identity: Option<&AuthenticatedUser>,
        session_key: &str,
    ) -> Result<(), RegistryError> {
        let user = AuthenticatedUser::require(identity)?.clone();
        let key: SessionKey = session_key.parse()?;

        let tx_key = key.clone();
        let outcome = self
            .store
            .run_transactional(move |tx| {
                if tx.load(&tx_key.entity_key())?.is_none() {
                    return Ok(WishlistRemoveOutcome::SessionNotFound);
                }
                let mut profile = get_or_create_in_tx(tx, &user)?;
                if !profile.remove_from_wishlist(&tx_key) {
                    return Ok(WishlistRemoveOutcome::NotInWishlist);
                }
                tx.save(Document::from_entity(&profile)?)?;
                Ok(WishlistRemoveOutcome::Removed)
            })
            .await
            .map_err(|e| internal("wishlist remove", e))?;

        match outcome {
            WishlistRemoveOutcome::Removed => {
                info!(session = %key, "session removed from wishlist");
                Ok(())
            }
            WishlistRemoveOutcome::SessionNotFound => {
                Err(RegistryError::not_found(format!("session {session_key}")))
            }
            WishlistRemoveOutcome::NotInWishlist => {
                Err(RegistryError::forbidden("not in wishlist"))
            }
        }
    }

    /// Resolves the caller's wishlist to live sessions by batch lookup.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the caller has no profile yet
    pub async fn list_wishlist(
        &self,
        identity: Option<&AuthenticatedUser>,
    ) -> Result<Vec<Session>, RegistryError> {
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
            .session_wishlist()
            .iter()
            .map(|k| k.entity_key())
            .collect();
        let docs = self
            .store
            .load_many(&keys)
            .await
            .map_err(|e| internal("wishlist lookup", e))?;
        decode_sessions(&docs)
    }

    /// Composed multi-predicate session query. Result order follows the
    /// seed term's result set.
    pub async fn query(&self, query: CompositeQuery) -> Result<Vec<Session>, RegistryError> {
        let docs = compose(self.store.as_ref(), SESSION_KIND, None, &query)
            .await
            .map_err(|e| internal("session query", e))?;
        decode_sessions(&docs)
    }

    /// Sessions starting before `start_time_before`, excluding one type:
    /// the store cannot answer this in one call, so it is composed as
    /// (start_time < H) minus (type_of_session == excluded).
    pub async fn query_problem(
        &self,
        start_time_before: u32,
        excluding_type: &str,
    ) -> Result<Vec<Session>, RegistryError> {
        let query = CompositeQuery::new()
            .matching(PropertyFilter::lt("start_time", start_time_before))
            .excluding(PropertyFilter::eq("type_of_session", excluding_type));
        self.query(query).await
    }

    /// Best-effort featured-speaker recomputation after a session save.
    async fn recompute_featured_speaker(&self, session: &Session) {
        let result = self
            .store
            .query(
                SESSION_KIND,
                Some(&session.conference_key().entity_key()),
                &[PropertyFilter::eq("speaker", session.speaker())],
                None,
            )
            .await;

        let docs = match result {
            Ok(docs) => docs,
            Err(err) => {
                warn!(error = %err, "featured-speaker query failed");
                return;
            }
        };
        if docs.len() < 2 {
            return;
        }

        let names: Vec<&str> = docs
            .iter()
            .filter_map(|d| d.field("name").and_then(|v| v.as_str()))
            .collect();
        let summary = format!("{}: {}", session.speaker(), names.join(", "));
        if let Err(err) = self.feed.set_featured_speaker(&summary).await {
            warn!(error = %err, "featured-speaker cache write failed");
        }
    }
}

fn decode_sessions(docs: &[Document]) -> Result<Vec<Session>, RegistryError> {
    docs.iter()
        .map(|d| d.to_entity())
        .collect::<Result<_, _>>()
        .map_err(|e| internal("session decode", e))
}
