//! Foundation module - Shared domain primitives.
//!
//! Contains the hierarchical key types, the authenticated-identity value
//! object, and the error taxonomy that form the vocabulary of the Confab
//! domain.

mod auth;
mod errors;
mod keys;

pub use auth::AuthenticatedUser;
pub use errors::RegistryError;
pub use keys::{
    ConferenceKey, EntityKey, KeyError, KeySegment, ProfileKey, SessionKey, CONFERENCE_KIND,
    PROFILE_KIND, SESSION_KIND,
};
