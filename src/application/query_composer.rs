//! Query composition over a single-inequality store.
//!
//! The store cannot combine an inequality filter with filters on other
//! fields in one call. A [`CompositeQuery`] is decomposed into one
//! store-native call per term and recombined in memory: intersection for
//! `Match` terms, set-difference for `Exclude` terms. Membership is decided
//! by full document identity, not just key equality.
//!
//! The final ordering follows the seed result set (the inequality term's
//! query, or the first term's). That is a documented limitation, not a
//! guarantee; callers wanting an order re-sort.

use crate::domain::foundation::EntityKey;
use crate::ports::{Document, EntityStore, PropertyFilter, StoreError};

/// One predicate of a composite query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTerm {
    /// Results must satisfy the filter (AND).
    Match(PropertyFilter),

    /// Results must not satisfy the filter (AND NOT).
    Exclude(PropertyFilter),
}

/// A multi-predicate query the store cannot answer natively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeQuery {
    terms: Vec<QueryTerm>,
}

impl CompositeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(mut self, filter: PropertyFilter) -> Self {
        self.terms.push(QueryTerm::Match(filter));
        self
    }

    pub fn excluding(mut self, filter: PropertyFilter) -> Self {
        self.terms.push(QueryTerm::Exclude(filter));
        self
    }

    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    /// Picks the seed term: the first inequality `Match`, falling back to
    /// the first `Match` of any kind.
    fn seed_index(&self) -> Option<usize> {
        self.terms
            .iter()
            .position(|t| matches!(t, QueryTerm::Match(f) if f.op.is_inequality()))
            .or_else(|| {
                self.terms
                    .iter()
                    .position(|t| matches!(t, QueryTerm::Match(_)))
            })
    }
}

/// Runs a composite query as a series of single-filter store calls combined
/// in memory.
pub async fn compose<S: EntityStore>(
    store: &S,
    kind: &str,
    ancestor: Option<&EntityKey>,
    query: &CompositeQuery,
) -> Result<Vec<Document>, StoreError> {
    let seed_index = query.seed_index();

    // Candidate set A: the seed query, or an unfiltered scan when the
    // composite has no Match terms at all.
    let mut candidates = match seed_index {
        Some(index) => {
            let QueryTerm::Match(filter) = &query.terms()[index] else {
                unreachable!("seed_index only selects Match terms");
            };
            store
                .query(kind, ancestor, std::slice::from_ref(filter), None)
                .await?
        }
        None => store.query(kind, ancestor, &[], None).await?,
    };

    for (index, term) in query.terms().iter().enumerate() {
        if Some(index) == seed_index {
            continue;
        }
        match term {
            QueryTerm::Match(filter) => {
                let matching = store
                    .query(kind, ancestor, std::slice::from_ref(filter), None)
                    .await?;
                candidates.retain(|doc| matching.contains(doc));
            }
            QueryTerm::Exclude(filter) => {
                let excluded = store
                    .query(kind, ancestor, std::slice::from_ref(filter), None)
                    .await?;
                candidates.retain(|doc| !excluded.contains(doc));
            }
        }
    }

    Ok(candidates)
}
