//! Client-supplied conference fields, prior to persistence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Organizer's input for creating a conference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceDraft {
    pub name: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub city: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_attendees: u32,
}

impl ConferenceDraft {
    /// Minimal draft with just a name and a seat capacity.
    pub fn named(name: impl Into<String>, max_attendees: u32) -> Self {
        Self {
            name: name.into(),
            max_attendees,
            ..Self::default()
        }
    }
}
