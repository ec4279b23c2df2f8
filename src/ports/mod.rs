//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `EntityStore` - transactional document store (the only synchronization
//!   primitive in the system)
//! - `Cache` - key/value side-cache with no TTL or eviction contract
//! - `NotificationQueue` - task dispatch, transactional with store commits

mod cache;
mod entity_store;
mod notification_queue;

pub use cache::{Cache, CacheError};
pub(crate) use entity_store::compare_values;
pub use entity_store::{
    Document, EntityStore, FilterOp, PropertyFilter, StorableEntity, StoreError,
    TransactionHandle,
};
pub use notification_queue::{NotificationError, NotificationQueue, NotificationTask};
