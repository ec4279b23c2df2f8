//! Entity store port: a transactional, hierarchically-keyed document store.
//!
//! The store addresses serialized entities by [`EntityKey`] and answers two
//! query shapes: ancestor scans and property filters. Its one hard
//! limitation drives the query-composition layer: a single call supports at
//! most one inequality filter, and an inequality cannot be combined with a
//! filter on a different field. Multi-predicate queries are decomposed by
//! the application layer and recombined in memory.
//!
//! # Transactions
//!
//! [`EntityStore::run_transactional`] hands a closure a [`TransactionHandle`]
//! with snapshot reads and buffered writes. Commit validates optimistically;
//! a concurrent conflicting commit fails exactly one of the two transactions
//! with [`StoreError::TransactionConflict`]. The store never retries.
//! Notifications enqueued through the handle are dispatched only after a
//! successful commit, so they are transactional with the writes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::EntityKey;

use super::NotificationTask;

/// Failures surfaced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Optimistic validation failed: another transaction committed a
    /// conflicting change first.
    #[error("transaction conflict on entity group")]
    TransactionConflict,

    /// The filter combination is not expressible in one native call.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Entity (de)serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Backend failure (connection loss, corruption, ...).
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// An entity type the store can persist.
///
/// Implementors pair a serde representation with a kind name and key
/// extraction so repositories stay schema-explicit instead of
/// annotation-driven.
pub trait StorableEntity: Serialize + DeserializeOwned {
    /// Store kind name, also the first component of query scoping.
    const KIND: &'static str;

    /// The full hierarchical key of this entity.
    fn store_key(&self) -> EntityKey;
}

/// A serialized entity as the store holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: EntityKey,
    pub kind: String,
    pub body: Value,
}

impl Document {
    /// Serializes an entity into its document form.
    pub fn from_entity<E: StorableEntity>(entity: &E) -> Result<Self, StoreError> {
        let body =
            serde_json::to_value(entity).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            key: entity.store_key(),
            kind: E::KIND.to_string(),
            body,
        })
    }

    /// Deserializes the document back into an entity, checking the kind.
    pub fn to_entity<E: StorableEntity>(&self) -> Result<E, StoreError> {
        if self.kind != E::KIND {
            return Err(StoreError::Serialization(format!(
                "expected kind '{}', document is '{}'",
                E::KIND,
                self.kind
            )));
        }
        serde_json::from_value(self.body.clone())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// A top-level field of the document body, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}

/// Comparison operator of a property filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FilterOp {
    /// `true` for every operator except equality.
    pub fn is_inequality(&self) -> bool {
        !matches!(self, FilterOp::Eq)
    }
}

/// One property comparison evaluated against document bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl PropertyFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Ge, value)
    }

    /// Evaluates the filter against a document body. Missing fields and
    /// cross-type comparisons never match.
    pub fn matches(&self, body: &Value) -> bool {
        let Some(actual) = body.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            _ => match compare_values(actual, &self.value) {
                Some(ordering) => match self.op {
                    FilterOp::Lt => ordering.is_lt(),
                    FilterOp::Le => ordering.is_le(),
                    FilterOp::Gt => ordering.is_gt(),
                    FilterOp::Ge => ordering.is_ge(),
                    FilterOp::Eq => unreachable!(),
                },
                None => false,
            },
        }
    }

    /// Validates that `filters` are expressible in one native call: at most
    /// one inequality, and once an inequality is present every filter must
    /// target that same field.
    pub fn validate_combination(filters: &[PropertyFilter]) -> Result<(), StoreError> {
        let mut inequality_field: Option<&str> = None;
        for filter in filters {
            if filter.op.is_inequality() {
                if inequality_field.is_some() {
                    return Err(StoreError::UnsupportedQuery(
                        "at most one inequality filter per query".to_string(),
                    ));
                }
                inequality_field = Some(&filter.field);
            }
        }
        if let Some(field) = inequality_field {
            if filters.iter().any(|f| f.field != field) {
                return Err(StoreError::UnsupportedQuery(format!(
                    "inequality on '{}' cannot be combined with a filter on another field",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Orders two JSON scalars when they are of comparable types.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64().partial_cmp(&r.as_f64()),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Scoped handle for the duration of one transaction.
///
/// Reads are snapshot-consistent, writes are buffered until commit, and
/// enqueued notifications are dispatched only if the commit succeeds.
pub trait TransactionHandle {
    fn load(&mut self, key: &EntityKey) -> Result<Option<Document>, StoreError>;

    fn save(&mut self, doc: Document) -> Result<(), StoreError>;

    fn save_all(&mut self, docs: Vec<Document>) -> Result<(), StoreError>;

    fn delete(&mut self, key: &EntityKey) -> Result<(), StoreError>;

    /// Queues a notification for dispatch after a successful commit.
    fn enqueue(&mut self, task: NotificationTask);
}

/// Transactional document store contract.
///
/// Not object-safe: `run_transactional` is generic over its result so
/// transaction bodies return typed outcomes instead of stringly reasons.
/// Services are generic over the store type.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// Loads one document by key.
    async fn load(&self, key: &EntityKey) -> Result<Option<Document>, StoreError>;

    /// Loads a batch of documents. Keys with no document are skipped; the
    /// result preserves the order of the keys that were found.
    async fn load_many(&self, keys: &[EntityKey]) -> Result<Vec<Document>, StoreError>;

    /// Persists documents outside any transaction.
    async fn save_all(&self, docs: Vec<Document>) -> Result<(), StoreError>;

    /// Removes one document. Absent keys are a no-op.
    async fn delete(&self, key: &EntityKey) -> Result<(), StoreError>;

    /// Allocates a numeric id, unique per kind for the lifetime of the
    /// store.
    async fn allocate_id(&self, kind: &str) -> Result<u64, StoreError>;

    /// All documents of `kind` strictly below `ancestor`, in `order_by`
    /// order (store order when `None`).
    async fn query_ancestor(
        &self,
        kind: &str,
        ancestor: &EntityKey,
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Filtered query, optionally ancestor-scoped. Fails
    /// [`StoreError::UnsupportedQuery`] when the filter combination exceeds
    /// the single-inequality contract.
    async fn query(
        &self,
        kind: &str,
        ancestor: Option<&EntityKey>,
        filters: &[PropertyFilter],
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Runs `work` atomically with optimistic conflict detection.
    ///
    /// # Errors
    ///
    /// - `TransactionConflict` when a concurrent commit invalidated a read
    /// - any error `work` itself returns, with all buffered writes discarded
    async fn run_transactional<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn TransactionHandle) -> Result<T, StoreError> + Send + 'static;
}
