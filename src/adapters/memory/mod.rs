//! In-memory adapters.
//!
//! Faithful to the port contracts including optimistic transaction
//! conflicts, so the full service stack can run and be tested without any
//! external infrastructure.

mod cache;
mod entity_store;
mod notification_queue;

pub use cache::InMemoryCache;
pub use entity_store::InMemoryEntityStore;
pub use notification_queue::InMemoryNotificationQueue;
