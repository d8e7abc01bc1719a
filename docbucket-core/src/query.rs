//! Query descriptors for collection scans and key lookups.
//!
//! A [`Query`] selects documents either by predicate (a filtered descending scan
//! with skip/count pagination) or by an explicit key list (point lookups). The two
//! selectors are mutually exclusive; executing a query that carries both is a
//! programming error and panics.
//!
//! # Example
//!
//! ```ignore
//! use docbucket::query::Query;
//!
//! let page = Query::builder()
//!     .filter(|fruit: &Fruit| fruit.name.starts_with('P'))
//!     .skip(0)
//!     .count(10)
//!     .build();
//! ```

use std::{fmt, sync::Arc};

/// A document predicate.
pub type Predicate<D> = Arc<dyn Fn(&D) -> bool + Send + Sync>;

/// Control signal returned by traversal visitors.
///
/// `Stop` ends a traversal early and is never reported as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Visit the next record.
    Continue,
    /// End the traversal successfully.
    Stop,
}

/// A structured query for retrieving documents.
pub struct Query<D> {
    /// Predicate selecting matching documents.
    pub filter: Option<Predicate<D>>,
    /// Keys to look up directly, in result order.
    pub keys: Option<Vec<Vec<u8>>>,
    /// Number of records visited and discarded before matching begins.
    pub skip: usize,
    /// Maximum number of matches to return; `0` means unbounded.
    pub count: usize,
}

impl<D> Query<D> {
    /// Creates a new empty query. Executing it reports [`InvalidQuery`].
    ///
    /// [`InvalidQuery`]: crate::error::DocumentStoreError::InvalidQuery
    pub fn new() -> Self {
        Self { filter: None, keys: None, skip: 0, count: 0 }
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder<D> {
        QueryBuilder::new()
    }

    /// Creates a scan query with the given predicate.
    pub fn filter(predicate: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        Self::builder().filter(predicate).build()
    }

    /// Creates a lookup query for the given keys.
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Self::builder().keys(keys).build()
    }

    /// Returns `true` when both a predicate and a key list are set.
    pub fn is_ambiguous(&self) -> bool {
        self.filter.is_some() && self.keys.is_some()
    }
}

impl<D> Default for Query<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for Query<D> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            keys: self.keys.clone(),
            skip: self.skip,
            count: self.count,
        }
    }
}

impl<D> fmt::Debug for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filter", &self.filter.is_some())
            .field("keys", &self.keys.as_ref().map(Vec::len))
            .field("skip", &self.skip)
            .field("count", &self.count)
            .finish()
    }
}

/// Fluent builder for [`Query`].
pub struct QueryBuilder<D> {
    query: Query<D>,
}

impl<D> QueryBuilder<D> {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::new() }
    }

    /// Sets the predicate for this query.
    pub fn filter(mut self, predicate: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        self.query.filter = Some(Arc::new(predicate));
        self
    }

    /// Adds keys to look up. Repeated calls append.
    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.query
            .keys
            .get_or_insert_with(Vec::new)
            .extend(keys.into_iter().map(|k| k.as_ref().to_vec()));
        self
    }

    /// Sets the number of visited records to discard before matching.
    pub fn skip(mut self, skip: usize) -> Self {
        self.query.skip = skip;
        self
    }

    /// Sets the maximum number of matches; `0` means unbounded.
    pub fn count(mut self, count: usize) -> Self {
        self.query.count = count;
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query<D> {
        self.query
    }
}

impl<D> Default for QueryBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pagination options for predicate finds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Number of records visited and discarded before matching begins.
    pub skip: usize,
    /// Maximum number of matches to return; `0` means unbounded.
    pub count: usize,
}

impl FindOptions {
    /// Options returning every match.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the skip count.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the match limit.
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}
