//! Session domain module.
//!
//! Sessions are scheduled talks/workshops under a conference. Creation and
//! update share one field-assignment routine so both paths normalize input
//! identically (speaker/type defaults, start-hour clamp, date-hour
//! overwrite).

mod aggregate;
mod draft;

pub use aggregate::{Session, DEFAULT_SPEAKER, DEFAULT_TYPE_OF_SESSION};
pub use draft::SessionDraft;
