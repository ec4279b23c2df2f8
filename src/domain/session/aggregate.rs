//! Session aggregate entity.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConferenceKey, EntityKey, RegistryError, SessionKey, SESSION_KIND};
use crate::ports::StorableEntity;

use super::SessionDraft;

/// Speaker recorded when the draft names none.
pub const DEFAULT_SPEAKER: &str = "Undefined";

/// Session type recorded when the draft names none.
pub const DEFAULT_TYPE_OF_SESSION: &str = "Undefined";

/// A talk/workshop under one conference.
///
/// # Invariants
///
/// - `name` is non-empty
/// - `start_time` is an hour of day in `[0, 24)`
/// - `date`, when present, carries `start_time` as its hour-of-day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Numeric id under the conference key.
    id: u64,

    /// Full key of the parent conference, kept for convenience lookups.
    conference_key: ConferenceKey,

    /// Denormalized numeric id of the parent conference.
    conference_id: u64,

    name: String,
    highlights: Option<String>,
    speaker: String,
    type_of_session: String,

    /// Hour of day the session starts, in `[0, 24)`.
    start_time: u32,

    date: Option<NaiveDateTime>,
    duration_minutes: u32,
}

impl Session {
    /// Creates a session from a draft, applying the shared normalization
    /// routine.
    ///
    /// # Errors
    ///
    /// - `Validation` when the draft has no name
    pub fn new(key: &SessionKey, draft: SessionDraft) -> Result<Self, RegistryError> {
        let mut session = Self {
            id: key.id(),
            conference_key: key.conference().clone(),
            conference_id: key.conference().id(),
            name: String::new(),
            highlights: None,
            speaker: DEFAULT_SPEAKER.to_string(),
            type_of_session: DEFAULT_TYPE_OF_SESSION.to_string(),
            start_time: 0,
            date: None,
            duration_minutes: 0,
        };
        session.apply_draft(draft)?;
        Ok(session)
    }

    /// Re-assigns every client-settable field from the draft. Used by both
    /// creation and update so normalization stays identical.
    ///
    /// Normalization:
    /// - absent speaker/type default to `"Undefined"`
    /// - start hour outside `[0, 24)` is coerced to 0
    /// - a present date has its hour-of-day overwritten with the start hour
    pub fn apply_draft(&mut self, draft: SessionDraft) -> Result<(), RegistryError> {
        let name = match draft.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(RegistryError::validation("name", "a session name is required")),
        };
        self.name = name;
        self.highlights = draft.highlights;
        self.speaker = draft.speaker.unwrap_or_else(|| DEFAULT_SPEAKER.to_string());
        self.type_of_session = draft
            .type_of_session
            .unwrap_or_else(|| DEFAULT_TYPE_OF_SESSION.to_string());
        self.duration_minutes = draft.duration_minutes;
        self.start_time = match u32::try_from(draft.start_time) {
            Ok(hour) if hour < 24 => hour,
            _ => 0,
        };
        // `with_hour` cannot fail here, the hour was just clamped below 24.
        self.date = draft.date.and_then(|date| date.with_hour(self.start_time));
        Ok(())
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.conference_key.clone(), self.id)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn conference_key(&self) -> &ConferenceKey {
        &self.conference_key
    }

    pub fn conference_id(&self) -> u64 {
        self.conference_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn highlights(&self) -> Option<&str> {
        self.highlights.as_deref()
    }

    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn type_of_session(&self) -> &str {
        &self.type_of_session
    }

    pub fn start_time(&self) -> u32 {
        self.start_time
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

impl StorableEntity for Session {
    const KIND: &'static str = SESSION_KIND;

    fn store_key(&self) -> EntityKey {
        self.key().entity_key()
    }
}
