//! Typed collections and their read paths.
//!
//! A [`Collection`] binds a document type to one bucket. Reads come in two shapes:
//! key lookups, which fetch each requested key directly, and predicate scans, which
//! walk the bucket newest-first and test every visited document. Writes live in
//! [`crate::mutation`].

use std::{fmt, sync::Arc};

use redb::{ReadableTable, ReadableTableMetadata};

use docbucket_core::{
    codec::{Codec, JsonCodec},
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult, display_key},
    hooks::{HookEvent, Hooks},
    key::KeyGenerator,
    query::{FindOptions, Flow, Query},
    validate::Validator,
};

use crate::{
    bucket::{self, backend},
    cursor::reverse_for_each,
    driver::Driver,
    result::QueryResult,
};

/// Documents matched by a read, aligned with the keys they are stored under.
#[derive(Debug)]
pub(crate) struct Matches<D> {
    pub documents: Vec<D>,
    pub keys: Vec<Vec<u8>>,
    /// Records visited by a scan. Always 0 for key lookups.
    pub visited: usize,
}

impl<D> Default for Matches<D> {
    fn default() -> Self {
        Self { documents: Vec::new(), keys: Vec::new(), visited: 0 }
    }
}

impl<D> Matches<D> {
    fn push(&mut self, document: D, key: Vec<u8>) {
        self.documents.push(document);
        self.keys.push(key);
    }
}

/// A typed view over one bucket of a [`Driver`].
///
/// Hooks, the key generator and the validator are configured per handle through the
/// fluent setters and apply to every write made through that handle.
///
/// # Example
///
/// ```ignore
/// use docbucket::prelude::*;
///
/// let mut fruits = driver.collection::<Fruit>("fruits")?;
/// fruits
///     .before_insert(|fruit| {
///         fruit.name = fruit.name.trim().to_string();
///         Ok(())
///     })
///     .key_generator(UuidKeys);
///
/// let key = fruits.insert(Fruit::new(" Apple "))?;
/// let apple = fruits.find_by_key(&key)?;
/// ```
pub struct Collection<D: Document, C: Codec = JsonCodec> {
    pub(crate) driver: Driver<C>,
    pub(crate) name: String,
    pub(crate) hooks: Hooks<D>,
    pub(crate) key_generator: Option<Arc<dyn KeyGenerator<D>>>,
    pub(crate) validator: Option<Arc<dyn Validator<D>>>,
}

impl<D: Document, C: Codec> Collection<D, C> {
    pub(crate) fn new(driver: Driver<C>, name: &str) -> Self {
        Self {
            driver,
            name: name.to_string(),
            hooks: Hooks::new(),
            key_generator: None,
            validator: None,
        }
    }

    /// Name of the bucket backing this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &Driver<C> {
        &self.driver
    }

    /// Registered hooks.
    pub fn hooks(&self) -> &Hooks<D> {
        &self.hooks
    }

    fn hook<F>(&mut self, event: HookEvent, hook: F) -> &mut Self
    where
        F: Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync + 'static,
    {
        self.hooks.set(event, Arc::new(hook));
        self
    }

    /// Runs before a document is validated and stored by an insert. May assign a key.
    pub fn before_insert<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync + 'static,
    {
        self.hook(HookEvent::BeforeInsert, hook)
    }

    /// Runs after an inserted document has been written, inside the same write
    /// transaction. An error undoes that document's write.
    pub fn after_insert<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync + 'static,
    {
        self.hook(HookEvent::AfterInsert, hook)
    }

    /// Runs before a document is stored by an update. May amend the document.
    pub fn before_update<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync + 'static,
    {
        self.hook(HookEvent::BeforeUpdate, hook)
    }

    /// Runs after an updated document has been written. An error rolls the update back.
    pub fn after_update<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync + 'static,
    {
        self.hook(HookEvent::AfterUpdate, hook)
    }

    /// Runs before a document is removed. An error keeps it.
    pub fn before_delete<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync + 'static,
    {
        self.hook(HookEvent::BeforeDelete, hook)
    }

    /// Runs after a document has been removed. An error rolls the delete back.
    pub fn after_delete<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut D) -> DocumentStoreResult<()> + Send + Sync + 'static,
    {
        self.hook(HookEvent::AfterDelete, hook)
    }

    /// Replaces the default sequence keys for documents inserted without a key.
    pub fn key_generator(&mut self, generator: impl KeyGenerator<D> + 'static) -> &mut Self {
        self.key_generator = Some(Arc::new(generator));
        self
    }

    /// Rejects inserts that fail `validator`. Updates are not validated.
    pub fn validator(&mut self, validator: impl Validator<D> + 'static) -> &mut Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Fetches the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`] if nothing decodable is
    /// stored under `key` or the bucket does not exist yet.
    pub fn find_by_key(&self, key: impl AsRef<[u8]>) -> DocumentStoreResult<D> {
        let key = key.as_ref();
        self.lookup_keys(&[key.to_vec()])?
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| DocumentStoreError::not_found(key, &self.name))
    }

    /// Fetches the documents stored under `keys`, in request order. Missing keys
    /// are skipped.
    pub fn find_by_keys<I, K>(&self, keys: I) -> DocumentStoreResult<Vec<D>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let keys: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        Ok(self.lookup_keys(&keys)?.documents)
    }

    /// Returns the newest document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`] if nothing matches and
    /// [`DocumentStoreError::BucketNotFound`] if the bucket does not exist.
    pub fn find_one<F>(&self, filter: F) -> DocumentStoreResult<D>
    where
        F: Fn(&D) -> bool,
    {
        self.find_one_with_key(filter).map(|(document, _)| document)
    }

    /// Like [`Collection::find_one`], also returning the key of the match.
    pub fn find_one_with_key<F>(&self, filter: F) -> DocumentStoreResult<(D, Vec<u8>)>
    where
        F: Fn(&D) -> bool,
    {
        let matches = self.scan(&filter, 0, 1)?;
        matches
            .documents
            .into_iter()
            .zip(matches.keys)
            .next()
            .ok_or_else(|| self.no_match())
    }

    /// Returns every document matching `filter`, newest first, honouring the
    /// pagination in `options`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`] if nothing matches.
    pub fn find<F>(&self, filter: F, options: FindOptions) -> DocumentStoreResult<Vec<D>>
    where
        F: Fn(&D) -> bool,
    {
        self.find_with_keys(filter, options).map(|(documents, _)| documents)
    }

    /// Like [`Collection::find`], also returning the matching keys.
    pub fn find_with_keys<F>(&self, filter: F, options: FindOptions) -> DocumentStoreResult<(Vec<D>, Vec<Vec<u8>>)>
    where
        F: Fn(&D) -> bool,
    {
        let matches = self.scan(&filter, options.skip, options.count)?;
        if matches.documents.is_empty() {
            return Err(self.no_match());
        }
        Ok((matches.documents, matches.keys))
    }

    /// Number of records in the bucket. A missing bucket counts as empty.
    pub fn count(&self) -> DocumentStoreResult<u64> {
        self.driver.read(|tx| match bucket::open_read(tx, &self.name) {
            Ok(table) => table.len().map_err(backend),
            Err(DocumentStoreError::BucketNotFound(_)) => Ok(0),
            Err(e) => Err(e),
        })
    }

    /// Runs `query` and returns a chainable [`QueryResult`].
    ///
    /// A key list is looked up directly and ignores pagination. A predicate runs a
    /// paginated scan. A query carrying neither yields a result holding
    /// [`DocumentStoreError::InvalidQuery`].
    ///
    /// # Panics
    ///
    /// Panics if `query` carries both a key list and a predicate.
    pub fn query(&self, query: Query<D>) -> QueryResult<'_, D, C> {
        assert!(!query.is_ambiguous(), "cannot use both keys and filter in one query");

        let outcome = match (query.keys, query.filter) {
            (Some(keys), _) => self.lookup_keys(&keys),
            (None, Some(filter)) => self.scan(filter.as_ref(), query.skip, query.count),
            (None, None) => Err(DocumentStoreError::InvalidQuery("no keys or filter given".to_string())),
        };

        match outcome {
            Ok(matches) => QueryResult::new(self, matches),
            Err(err) => {
                log::debug!("query on {} failed: {err}", self.name);
                QueryResult::failed(self, err)
            }
        }
    }

    fn no_match(&self) -> DocumentStoreError {
        DocumentStoreError::DocumentNotFound("matching filter".to_string(), self.name.clone())
    }

    /// Fetches each key in order. Absent keys and undecodable records are skipped,
    /// and a missing bucket yields no matches.
    pub(crate) fn lookup_keys(&self, keys: &[Vec<u8>]) -> DocumentStoreResult<Matches<D>> {
        let codec = self.driver.codec();
        self.driver.read(|tx| {
            let table = match bucket::open_read(tx, &self.name) {
                Ok(table) => table,
                Err(DocumentStoreError::BucketNotFound(_)) => return Ok(Matches::default()),
                Err(e) => return Err(e),
            };

            let mut matches = Matches::default();
            for key in keys {
                let Some(value) = table.get(key.as_slice()).map_err(backend)? else {
                    continue;
                };
                match codec.decode::<D>(value.value()) {
                    Ok(document) => matches.push(document, key.clone()),
                    Err(err) => log::debug!("skipping {} in {}: {err}", display_key(key), self.name),
                }
            }
            Ok(matches)
        })
    }

    /// Walks the bucket newest-first. Records at positions up to `skip` are passed
    /// over untested; the walk stops once `count` documents match, or at the end
    /// when `count` is 0. `visited` is the number of records walked.
    pub(crate) fn scan<F>(&self, filter: &F, skip: usize, count: usize) -> DocumentStoreResult<Matches<D>>
    where
        F: Fn(&D) -> bool + ?Sized,
    {
        let codec = self.driver.codec();
        let matches = self.driver.read(|tx| {
            let table = bucket::open_read(tx, &self.name)?;
            let mut matches = Matches::default();

            let visited = reverse_for_each(&table, |position, key, value| {
                if position <= skip {
                    return Ok(Flow::Continue);
                }

                let document: D = codec.decode(value)?;
                if filter(&document) {
                    matches.push(document, key.to_vec());
                    if count > 0 && matches.documents.len() >= count {
                        return Ok(Flow::Stop);
                    }
                }
                Ok(Flow::Continue)
            })?;
            matches.visited = visited;
            Ok(matches)
        })?;

        log::debug!(
            "scanned {} records in {}, {} matched",
            matches.visited,
            self.name,
            matches.documents.len()
        );
        Ok(matches)
    }
}

impl<D: Document, C: Codec> Clone for Collection<D, C> {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver.clone(),
            name: self.name.clone(),
            hooks: self.hooks.clone(),
            key_generator: self.key_generator.clone(),
            validator: self.validator.clone(),
        }
    }
}

impl<D: Document, C: Codec> fmt::Debug for Collection<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("hooks", &self.hooks)
            .field("key_generator", &self.key_generator.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
