//! In-Memory Entity Store Adapter
//!
//! Versioned document map with snapshot reads, buffered writes, and
//! optimistic commit validation. Useful for testing and development; the
//! production store is an external collaborator.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::domain::foundation::EntityKey;
use crate::ports::{
    compare_values, Document, EntityStore, NotificationQueue, NotificationTask, PropertyFilter,
    StoreError, TransactionHandle,
};

#[derive(Debug, Clone)]
struct VersionedDocument {
    version: u64,
    doc: Document,
}

#[derive(Default)]
struct StoreState {
    /// Encoded key -> versioned document.
    records: HashMap<String, VersionedDocument>,

    /// Per-kind id allocator.
    counters: HashMap<String, u64>,
}

/// In-memory store with optimistic transactions.
///
/// Transaction reads take a version snapshot per key; commit re-validates
/// every read version under the state lock and fails with
/// [`StoreError::TransactionConflict`] when a concurrent commit got there
/// first. Notifications enqueued inside a transaction are dispatched to the
/// [`NotificationQueue`] only after a successful commit; a dispatch failure
/// at that point is logged and swallowed since the writes are already
/// durable.
#[derive(Clone)]
pub struct InMemoryEntityStore {
    state: Arc<Mutex<StoreState>>,
    notifications: Arc<dyn NotificationQueue>,
}

impl InMemoryEntityStore {
    pub fn new(notifications: Arc<dyn NotificationQueue>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            notifications,
        }
    }

    /// Number of stored documents (useful for tests).
    pub fn record_count(&self) -> usize {
        self.lock_state().records.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sorted(mut docs: Vec<Document>, order_by: Option<&str>) -> Vec<Document> {
        match order_by {
            Some(field) => {
                docs.sort_by(|a, b| match (a.field(field), b.field(field)) {
                    (Some(left), Some(right)) => {
                        compare_values(left, right).unwrap_or(std::cmp::Ordering::Equal)
                    }
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                });
            }
            // Store default order: by encoded key, for determinism.
            None => docs.sort_by(|a, b| a.key.encode().cmp(&b.key.encode())),
        }
        docs
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<StoreState>>,

    /// Version observed per read key; `None` when the key was absent.
    reads: HashMap<String, Option<u64>>,

    /// Buffered mutations; `None` is a delete.
    writes: HashMap<String, Option<Document>>,

    queued: Vec<NotificationTask>,
}

impl MemoryTransaction {
    fn new(state: Arc<Mutex<StoreState>>) -> Self {
        Self {
            state,
            reads: HashMap::new(),
            writes: HashMap::new(),
            queued: Vec::new(),
        }
    }

    fn commit(self) -> Result<Vec<NotificationTask>, StoreError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for (key, observed) in &self.reads {
            let current = state.records.get(key).map(|record| record.version);
            if current != *observed {
                return Err(StoreError::TransactionConflict);
            }
        }

        for (key, write) in self.writes {
            match write {
                Some(doc) => {
                    let version = state
                        .records
                        .get(&key)
                        .map(|record| record.version + 1)
                        .unwrap_or(1);
                    state.records.insert(key, VersionedDocument { version, doc });
                }
                None => {
                    state.records.remove(&key);
                }
            }
        }

        Ok(self.queued)
    }
}

impl TransactionHandle for MemoryTransaction {
    fn load(&mut self, key: &EntityKey) -> Result<Option<Document>, StoreError> {
        let encoded = key.encode();

        // Read-your-writes within the transaction.
        if let Some(write) = self.writes.get(&encoded) {
            return Ok(write.clone());
        }

        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let record = state.records.get(&encoded);
        self.reads
            .entry(encoded)
            .or_insert_with(|| record.map(|r| r.version));
        Ok(record.map(|r| r.doc.clone()))
    }

    fn save(&mut self, doc: Document) -> Result<(), StoreError> {
        self.writes.insert(doc.key.encode(), Some(doc));
        Ok(())
    }

    fn save_all(&mut self, docs: Vec<Document>) -> Result<(), StoreError> {
        for doc in docs {
            self.save(doc)?;
        }
        Ok(())
    }

    fn delete(&mut self, key: &EntityKey) -> Result<(), StoreError> {
        self.writes.insert(key.encode(), None);
        Ok(())
    }

    fn enqueue(&mut self, task: NotificationTask) {
        self.queued.push(task);
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn load(&self, key: &EntityKey) -> Result<Option<Document>, StoreError> {
        let state = self.lock_state();
        Ok(state.records.get(&key.encode()).map(|r| r.doc.clone()))
    }

    async fn load_many(&self, keys: &[EntityKey]) -> Result<Vec<Document>, StoreError> {
        let state = self.lock_state();
        Ok(keys
            .iter()
            .filter_map(|key| state.records.get(&key.encode()).map(|r| r.doc.clone()))
            .collect())
    }

    async fn save_all(&self, docs: Vec<Document>) -> Result<(), StoreError> {
        let mut state = self.lock_state();
        for doc in docs {
            let key = doc.key.encode();
            let version = state
                .records
                .get(&key)
                .map(|record| record.version + 1)
                .unwrap_or(1);
            state.records.insert(key, VersionedDocument { version, doc });
        }
        Ok(())
    }

    async fn delete(&self, key: &EntityKey) -> Result<(), StoreError> {
        let mut state = self.lock_state();
        state.records.remove(&key.encode());
        Ok(())
    }

    async fn allocate_id(&self, kind: &str) -> Result<u64, StoreError> {
        let mut state = self.lock_state();
        let counter = state.counters.entry(kind.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn query_ancestor(
        &self,
        kind: &str,
        ancestor: &EntityKey,
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        let docs: Vec<Document> = {
            let state = self.lock_state();
            state
                .records
                .values()
                .filter(|r| r.doc.kind == kind && r.doc.key.is_descendant_of(ancestor))
                .map(|r| r.doc.clone())
                .collect()
        };
        Ok(Self::sorted(docs, order_by))
    }

    async fn query(
        &self,
        kind: &str,
        ancestor: Option<&EntityKey>,
        filters: &[PropertyFilter],
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        PropertyFilter::validate_combination(filters)?;
        let docs: Vec<Document> = {
            let state = self.lock_state();
            state
                .records
                .values()
                .filter(|r| r.doc.kind == kind)
                .filter(|r| ancestor.map_or(true, |a| r.doc.key.is_descendant_of(a)))
                .filter(|r| filters.iter().all(|f| f.matches(&r.doc.body)))
                .map(|r| r.doc.clone())
                .collect()
        };
        Ok(Self::sorted(docs, order_by))
    }

    async fn run_transactional<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn TransactionHandle) -> Result<T, StoreError> + Send + 'static,
    {
        let mut tx = MemoryTransaction::new(Arc::clone(&self.state));
        let result = work(&mut tx)?;
        let queued = tx.commit()?;

        debug!(notifications = queued.len(), "transaction committed");
        for task in queued {
            if let Err(err) = self.notifications.enqueue(task).await {
                // Writes are already durable; the lost task is an
                // operational problem, not a caller error.
                error!(error = %err, "post-commit notification dispatch failed");
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryNotificationQueue;
    use serde::{Deserialize, Serialize};
    use std::sync::Barrier;

    use crate::ports::StorableEntity;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        id: String,
        value: u32,
    }

    impl StorableEntity for Counter {
        const KIND: &'static str = "Counter";

        fn store_key(&self) -> EntityKey {
            EntityKey::root(Self::KIND, &self.id).unwrap()
        }
    }

    fn store() -> (InMemoryEntityStore, Arc<InMemoryNotificationQueue>) {
        let queue = Arc::new(InMemoryNotificationQueue::new());
        (InMemoryEntityStore::new(queue.clone()), queue)
    }

    fn counter_doc(id: &str, value: u32) -> Document {
        Document::from_entity(&Counter {
            id: id.to_string(),
            value,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let (store, _) = store();
        store.save_all(vec![counter_doc("c1", 5)]).await.unwrap();
        let doc = store
            .load(&EntityKey::root("Counter", "c1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.to_entity::<Counter>().unwrap().value, 5);
    }

    #[tokio::test]
    async fn load_many_skips_absent_keys() {
        let (store, _) = store();
        store.save_all(vec![counter_doc("c1", 1)]).await.unwrap();
        let keys = [
            EntityKey::root("Counter", "c0").unwrap(),
            EntityKey::root("Counter", "c1").unwrap(),
        ];
        let docs = store.load_many(&keys).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn allocated_ids_are_unique_per_kind() {
        let (store, _) = store();
        let a = store.allocate_id("Conference").await.unwrap();
        let b = store.allocate_id("Conference").await.unwrap();
        let c = store.allocate_id("Session").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(c, 1);
    }

    #[tokio::test]
    async fn unsupported_filter_combination_is_rejected() {
        let (store, _) = store();
        let filters = [
            PropertyFilter::lt("value", 3),
            PropertyFilter::eq("id", "c1"),
        ];
        let err = store.query("Counter", None, &filters, None).await.unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedQuery(_)));
    }

    #[tokio::test]
    async fn query_orders_by_requested_field() {
        let (store, _) = store();
        store
            .save_all(vec![counter_doc("b", 2), counter_doc("a", 1), counter_doc("c", 3)])
            .await
            .unwrap();
        let docs = store.query("Counter", None, &[], Some("id")).await.unwrap();
        let ids: Vec<String> = docs
            .iter()
            .map(|d| d.to_entity::<Counter>().unwrap().id)
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn transaction_reads_its_own_writes() {
        let (store, _) = store();
        let value = store
            .run_transactional(|tx| {
                tx.save(counter_doc("c1", 9))?;
                let doc = tx
                    .load(&EntityKey::root("Counter", "c1").unwrap())?
                    .expect("just written");
                Ok(doc.to_entity::<Counter>().unwrap().value)
            })
            .await
            .unwrap();
        assert_eq!(value, 9);
    }

    #[tokio::test]
    async fn failed_work_discards_buffered_writes() {
        let (store, _) = store();
        let result: Result<(), StoreError> = store
            .run_transactional(|tx| {
                tx.save(counter_doc("c1", 9))?;
                Err(StoreError::Backend("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn notifications_dispatch_only_after_commit() {
        let (store, queue) = store();

        let result: Result<(), StoreError> = store
            .run_transactional(|tx| {
                tx.enqueue(NotificationTask::new("a@example.com", "never sent"));
                Err(StoreError::Backend("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(queue.sent().await.is_empty());

        store
            .run_transactional(|tx| {
                tx.enqueue(NotificationTask::new("a@example.com", "sent"));
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(queue.sent().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_conflicting_transactions_lose_exactly_one() {
        let (store, _) = store();
        store.save_all(vec![counter_doc("c1", 0)]).await.unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                store
                    .run_transactional(move |tx| {
                        let key = EntityKey::root("Counter", "c1").unwrap();
                        let doc = tx.load(&key)?.expect("seeded");
                        let counter: Counter = doc.to_entity().unwrap();
                        // Hold both transactions at the same point so both
                        // observe the same version before either commits.
                        barrier.wait();
                        tx.save(counter_doc(&counter.id, counter.value + 1))?;
                        Ok(())
                    })
                    .await
            }));
        }

        let mut conflicts = 0;
        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(StoreError::TransactionConflict) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);

        let doc = store
            .load(&EntityKey::root("Counter", "c1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.to_entity::<Counter>().unwrap().value, 1);
    }
}
