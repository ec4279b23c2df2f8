//! Conference domain module.
//!
//! A conference is organized by one profile (its key ancestor) and carries
//! a fixed seat capacity. Seat booking and release are the only mutations
//! after creation.

mod aggregate;
mod draft;

pub use aggregate::Conference;
pub use draft::ConferenceDraft;
