//! Client-supplied session fields, prior to normalization.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Input for creating or updating a session.
///
/// Deliberately loose: `name` may be absent (rejected at assignment time)
/// and `start_time` may be out of range (coerced to 0).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub name: Option<String>,
    pub highlights: Option<String>,
    pub speaker: Option<String>,
    pub type_of_session: Option<String>,
    pub start_time: i32,
    pub date: Option<NaiveDateTime>,
    pub duration_minutes: u32,
}

impl SessionDraft {
    /// Minimal named draft.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn with_type(mut self, type_of_session: impl Into<String>) -> Self {
        self.type_of_session = Some(type_of_session.into());
        self
    }

    pub fn with_start_time(mut self, start_time: i32) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = Some(date);
        self
    }
}
