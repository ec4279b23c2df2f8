//! Profile aggregate entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConferenceKey, EntityKey, ProfileKey, SessionKey, PROFILE_KIND};
use crate::ports::StorableEntity;

use super::ShirtSize;

/// Attendee/organizer profile.
///
/// # Invariants
///
/// - `conferences_to_attend` contains no duplicates
/// - `session_wishlist` contains no duplicates
/// - Never deleted in normal operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity-provider id, also the storage key.
    user_id: String,

    /// Name shown to other attendees.
    display_name: String,

    /// Primary contact email.
    main_email: String,

    /// Tee-shirt size preference.
    shirt_size: ShirtSize,

    /// Conferences the attendee holds a seat for, in registration order.
    conferences_to_attend: Vec<ConferenceKey>,

    /// Sessions the attendee wants to track, in insertion order.
    session_wishlist: Vec<SessionKey>,
}

impl Profile {
    /// Creates a fresh profile with empty membership lists.
    pub fn new(
        key: &ProfileKey,
        display_name: impl Into<String>,
        main_email: impl Into<String>,
        shirt_size: ShirtSize,
    ) -> Self {
        Self {
            user_id: key.user_id().to_string(),
            display_name: display_name.into(),
            main_email: main_email.into(),
            shirt_size,
            conferences_to_attend: Vec::new(),
            session_wishlist: Vec::new(),
        }
    }

    pub fn key(&self) -> ProfileKey {
        ProfileKey::new(&self.user_id).expect("stored user id is pre-validated")
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn main_email(&self) -> &str {
        &self.main_email
    }

    pub fn shirt_size(&self) -> ShirtSize {
        self.shirt_size
    }

    pub fn conferences_to_attend(&self) -> &[ConferenceKey] {
        &self.conferences_to_attend
    }

    pub fn session_wishlist(&self) -> &[SessionKey] {
        &self.session_wishlist
    }

    /// Overwrites only the provided fields. A `None` leaves the field as is.
    pub fn update(&mut self, display_name: Option<String>, shirt_size: Option<ShirtSize>) {
        if let Some(display_name) = display_name {
            self.display_name = display_name;
        }
        if let Some(shirt_size) = shirt_size {
            self.shirt_size = shirt_size;
        }
    }

    pub fn is_attending(&self, conference: &ConferenceKey) -> bool {
        self.conferences_to_attend.contains(conference)
    }

    /// Records attendance. Returns `false` (and leaves the list untouched)
    /// when the conference is already present.
    pub fn add_conference(&mut self, conference: ConferenceKey) -> bool {
        if self.is_attending(&conference) {
            return false;
        }
        self.conferences_to_attend.push(conference);
        true
    }

    /// Drops attendance. Returns `false` when the conference was never
    /// registered; callers must branch on this.
    pub fn remove_conference(&mut self, conference: &ConferenceKey) -> bool {
        let before = self.conferences_to_attend.len();
        self.conferences_to_attend.retain(|key| key != conference);
        self.conferences_to_attend.len() < before
    }

    pub fn has_wishlisted(&self, session: &SessionKey) -> bool {
        self.session_wishlist.contains(session)
    }

    /// Adds a session to the wishlist. Returns `false` on duplicates.
    pub fn add_to_wishlist(&mut self, session: SessionKey) -> bool {
        if self.has_wishlisted(&session) {
            return false;
        }
        self.session_wishlist.push(session);
        true
    }

    /// Removes a session from the wishlist. Returns `false` when absent.
    pub fn remove_from_wishlist(&mut self, session: &SessionKey) -> bool {
        let before = self.session_wishlist.len();
        self.session_wishlist.retain(|key| key != session);
        self.session_wishlist.len() < before
    }
}

impl StorableEntity for Profile {
    const KIND: &'static str = PROFILE_KIND;

    fn store_key(&self) -> EntityKey {
        self.key().entity_key()
    }
}
