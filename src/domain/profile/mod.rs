//! Profile domain module.
//!
//! An attendee/organizer profile is created lazily on first access by a
//! given identity and records which conferences the attendee will attend
//! and which sessions they have wishlisted.

mod aggregate;
mod shirt_size;

pub use aggregate::Profile;
pub use shirt_size::ShirtSize;
