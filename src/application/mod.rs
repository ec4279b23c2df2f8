//! Application layer - the services of the registry.
//!
//! Each service takes its collaborators (store, cache, identity) explicitly;
//! there is no ambient/static access to anything.
//!
//! - `ProfileService` - get-or-create and update attendee profiles
//! - `ConferenceRegistry` - conference creation and transactional seat booking
//! - `SessionCatalog` - sessions, wishlists, featured-speaker recomputation
//! - `query_composer` - multi-predicate queries over a single-inequality store
//! - `AnnouncementFeed` - read-through access to the two cache slots

mod announcement_feed;
mod conference_registry;
mod profile_service;
pub mod query_composer;
mod session_catalog;

pub use announcement_feed::AnnouncementFeed;
pub use conference_registry::ConferenceRegistry;
pub use profile_service::ProfileService;
pub use query_composer::{CompositeQuery, QueryTerm};
pub use session_catalog::SessionCatalog;

use tracing::error;

use crate::domain::foundation::RegistryError;
use crate::ports::StoreError;

/// Downgrades an unexpected store failure to the caller-facing `Internal`
/// error, logging the detail that the taxonomy deliberately hides.
pub(crate) fn internal(context: &'static str, err: StoreError) -> RegistryError {
    error!(context, error = %err, "store operation failed");
    RegistryError::internal(err.to_string())
}
