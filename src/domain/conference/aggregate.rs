//! Conference aggregate entity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ConferenceKey, EntityKey, ProfileKey, CONFERENCE_KIND};
use crate::ports::StorableEntity;

use super::ConferenceDraft;

/// A published conference with a fixed seat capacity.
///
/// # Invariants
///
/// - `0 <= seats_available <= max_attendees` at all times
/// - `max_attendees` is immutable after creation
/// - Only seat booking/release mutate the aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    /// Numeric id under the organizer's profile key.
    id: u64,

    /// Identity-provider id of the organizer (key ancestor).
    organizer_user_id: String,

    /// Denormalized copy of the organizer's display name.
    organizer_display_name: String,

    name: String,
    description: Option<String>,
    topics: Vec<String>,
    city: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,

    /// Seat capacity, fixed at creation.
    max_attendees: u32,

    /// Seats still bookable. Starts equal to `max_attendees`.
    seats_available: u32,
}

impl Conference {
    /// Creates a conference from an organizer draft, all seats available.
    pub fn new(key: &ConferenceKey, organizer_display_name: impl Into<String>, draft: ConferenceDraft) -> Self {
        Self {
            id: key.id(),
            organizer_user_id: key.organizer().user_id().to_string(),
            organizer_display_name: organizer_display_name.into(),
            name: draft.name,
            description: draft.description,
            topics: draft.topics,
            city: draft.city,
            start_date: draft.start_date,
            end_date: draft.end_date,
            max_attendees: draft.max_attendees,
            seats_available: draft.max_attendees,
        }
    }

    pub fn key(&self) -> ConferenceKey {
        ConferenceKey::new(
            ProfileKey::new(&self.organizer_user_id).expect("stored organizer id is pre-validated"),
            self.id,
        )
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn organizer_user_id(&self) -> &str {
        &self.organizer_user_id
    }

    pub fn organizer_display_name(&self) -> &str {
        &self.organizer_display_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn max_attendees(&self) -> u32 {
        self.max_attendees
    }

    pub fn seats_available(&self) -> u32 {
        self.seats_available
    }

    /// Books `count` seats. Returns `false` (no change) when fewer than
    /// `count` seats remain.
    pub fn book_seats(&mut self, count: u32) -> bool {
        if self.seats_available < count {
            return false;
        }
        self.seats_available -= count;
        true
    }

    /// Returns `count` seats to the pool, capped at `max_attendees` so the
    /// capacity invariant holds even if release is ever over-counted.
    pub fn release_seats(&mut self, count: u32) {
        self.seats_available = self
            .seats_available
            .saturating_add(count)
            .min(self.max_attendees);
    }
}

impl fmt::Display for Conference {
    /// Human-readable summary, used as the confirmation notification payload.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        if let Some(description) = &self.description {
            writeln!(f, "Description: {}", description)?;
        }
        if !self.topics.is_empty() {
            writeln!(f, "Topics: {}", self.topics.join(", "))?;
        }
        if let Some(city) = &self.city {
            writeln!(f, "City: {}", city)?;
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            writeln!(f, "Dates: {} - {}", start, end)?;
        }
        write!(f, "Max attendees: {}", self.max_attendees)
    }
}

impl StorableEntity for Conference {
    const KIND: &'static str = CONFERENCE_KIND;

    fn store_key(&self) -> EntityKey {
        self.key().entity_key()
    }
}
