//! Chainable query results.
//!
//! A [`QueryResult`] carries the documents a query matched together with the keys
//! they are stored under and the pagination cursor. Chain steps are skipped once
//! the result holds an error, so a pipeline reports the first failure.

use std::mem;

use docbucket_core::{
    codec::{Codec, JsonCodec},
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    page::Page,
};

use crate::{bucket, collection::{Collection, Matches}};

/// Outcome of [`Collection::query`].
///
/// # Example
///
/// ```ignore
/// let removed = fruits
///     .query(Query::filter(|fruit: &Fruit| fruit.name.starts_with('P')))
///     .validate(|result| if result.count() > 10 { Err(DocumentStoreError::hook("too many")) } else { Ok(()) })
///     .delete()?;
/// ```
pub struct QueryResult<'c, D: Document, C: Codec = JsonCodec> {
    collection: &'c Collection<D, C>,
    items: Vec<D>,
    keys: Vec<Vec<u8>>,
    next: usize,
    error: Option<DocumentStoreError>,
}

impl<'c, D: Document, C: Codec> QueryResult<'c, D, C> {
    pub(crate) fn new(collection: &'c Collection<D, C>, matches: Matches<D>) -> Self {
        Self {
            collection,
            items: matches.documents,
            keys: matches.keys,
            next: matches.visited,
            error: None,
        }
    }

    pub(crate) fn failed(collection: &'c Collection<D, C>, error: DocumentStoreError) -> Self {
        Self {
            collection,
            items: Vec::new(),
            keys: Vec::new(),
            next: 0,
            error: Some(error),
        }
    }

    /// Keeps only the items matching `predicate`, along with their keys.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&D) -> bool,
    {
        if self.error.is_some() {
            return self;
        }

        let (items, keys): (Vec<D>, Vec<Vec<u8>>) = mem::take(&mut self.items)
            .into_iter()
            .zip(mem::take(&mut self.keys))
            .filter(|(item, _)| predicate(item))
            .unzip();
        self.items = items;
        self.keys = keys;
        self
    }

    /// Runs a check against the whole result, recording its error.
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&Self) -> DocumentStoreResult<()>,
    {
        if self.error.is_none() {
            if let Err(err) = check(&self) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Calls `f` on each item in order, stopping at and recording the first error.
    pub fn iterate<F>(mut self, mut f: F) -> Self
    where
        F: FnMut(&mut D) -> DocumentStoreResult<()>,
    {
        if self.error.is_some() {
            return self;
        }

        for item in self.items.iter_mut() {
            if let Err(err) = f(item) {
                self.error = Some(err);
                break;
            }
        }
        self
    }

    /// Stores every item under its own key with the update hooks, in one write
    /// transaction. Returns the number of items written.
    ///
    /// # Errors
    ///
    /// Returns the recorded error if the result holds one, otherwise any error
    /// from the write. An empty result writes nothing and returns 0.
    pub fn update(self) -> DocumentStoreResult<usize> {
        if let Some(err) = self.error {
            return Err(err);
        }

        if self.items.is_empty() {
            return Ok(0);
        }

        let collection = self.collection;
        let mut items = self.items;
        let updated = collection.driver.write(|tx| {
            let mut table = bucket::open_write(tx, collection.name())?;
            for item in items.iter_mut() {
                collection.store_update(&mut table, None, item)?;
            }
            Ok(items.len())
        })?;
        log::debug!("updated {updated} queried documents in {}", collection.name());
        Ok(updated)
    }

    /// Removes every item by its own key with the delete hooks, in one write
    /// transaction. Returns the number of items removed.
    ///
    /// # Errors
    ///
    /// Returns the recorded error if the result holds one, otherwise any error
    /// from the write.
    pub fn delete(self) -> DocumentStoreResult<usize> {
        if let Some(err) = self.error {
            return Err(err);
        }

        if self.items.is_empty() {
            return Ok(0);
        }

        let collection = self.collection;
        let mut items = self.items;
        let deleted = collection.driver.write(|tx| {
            let mut table = bucket::open_write(tx, collection.name())?;
            for item in items.iter_mut() {
                collection.store_delete(&mut table, None, item)?;
            }
            Ok(items.len())
        })?;
        log::debug!("deleted {deleted} queried documents from {}", collection.name());
        Ok(deleted)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn any(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn first(&self) -> Option<&D> {
        self.items.first()
    }

    pub fn items(&self) -> &[D] {
        &self.items
    }

    /// Keys aligned index for index with [`QueryResult::items`].
    pub fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    /// Records visited by the scan, to pass as `skip` for the following page.
    /// Zero for key lookups and failed queries.
    pub fn next(&self) -> usize {
        self.next
    }

    pub fn error(&self) -> Option<&DocumentStoreError> {
        self.error.as_ref()
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Consumes the result, returning its items or its error.
    pub fn into_items(self) -> DocumentStoreResult<Vec<D>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.items),
        }
    }

    /// Packages the items and cursor as a serializable [`Page`].
    pub fn page(&self) -> Page<D> {
        Page::builder(self.items.clone()).with_next(self.next).build()
    }
}

impl<D: Document + std::fmt::Debug, C: Codec> std::fmt::Debug for QueryResult<'_, D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResult")
            .field("collection", &self.collection.name())
            .field("items", &self.items)
            .field("next", &self.next)
            .field("error", &self.error)
            .finish()
    }
}
