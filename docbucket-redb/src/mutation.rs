//! Write paths of a [`Collection`].
//!
//! Each public operation runs in exactly one write transaction: every document of
//! a batch, every hook, and key-sequence advances commit together or not at all.

use redb::{ReadableTable, ReadableTableMetadata, WriteTransaction};

use docbucket_core::{
    codec::Codec,
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult, display_key},
    hooks::HookEvent,
    key::sequence_key,
};

use crate::{
    bucket::{self, BucketTable, backend},
    collection::Collection,
    cursor::ReverseCursor,
    metadata,
};

/// Options for [`Collection::insert_many_with`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertOptions {
    /// Overwrite existing documents instead of failing with
    /// [`DocumentStoreError::DocumentExists`].
    pub upsert: bool,
    /// Record per-document failures in the [`InsertReport`] and keep going.
    pub ignore_errors: bool,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    pub fn ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }
}

/// A document that failed to insert under [`InsertOptions::ignore_errors`].
#[derive(Debug)]
pub struct InsertFailure {
    /// Position of the document in the submitted batch.
    pub index: usize,
    pub error: DocumentStoreError,
}

/// Outcome of a batch insert.
#[derive(Debug, Default)]
pub struct InsertReport {
    /// Keys of the stored documents, in submission order.
    pub keys: Vec<Vec<u8>>,
    /// Documents that were skipped. Always empty unless errors are ignored.
    pub failures: Vec<InsertFailure>,
}

impl InsertReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<D: Document, C: Codec> Collection<D, C> {
    /// Inserts one document and returns its key.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentExists`] if the document carries a key
    /// that is already stored, [`DocumentStoreError::ValidationFailed`] if the
    /// validator rejects it, or any error raised by a hook.
    pub fn insert(&self, document: D) -> DocumentStoreResult<Vec<u8>> {
        let keys = self.insert_many(std::iter::once(document))?;
        keys.into_iter()
            .next()
            .ok_or_else(|| DocumentStoreError::Backend("insert stored no document".to_string()))
    }

    /// Inserts one document with explicit options.
    pub fn insert_with(&self, document: D, options: InsertOptions) -> DocumentStoreResult<InsertReport> {
        self.insert_many_with(std::iter::once(document), options)
    }

    /// Inserts a batch atomically and returns the keys in submission order.
    pub fn insert_many(&self, documents: impl IntoIterator<Item = D>) -> DocumentStoreResult<Vec<Vec<u8>>> {
        Ok(self.insert_many_with(documents, InsertOptions::default())?.keys)
    }

    /// Inserts a batch in one write transaction.
    ///
    /// For each document, in order: existence check (skipped for upserts and for
    /// documents without a key), validation, the before-insert hook, key
    /// assignment, a second existence check on the resolved key, encoding, the
    /// write, and the after-insert hook. A failing after-insert hook undoes the
    /// write of its document.
    ///
    /// # Errors
    ///
    /// Without `ignore_errors` the first failing document aborts the whole batch.
    /// With it, failures are collected in the report and the remaining documents
    /// are still written.
    pub fn insert_many_with(
        &self,
        documents: impl IntoIterator<Item = D>,
        options: InsertOptions,
    ) -> DocumentStoreResult<InsertReport> {
        let report = self.driver.write(|tx| self.insert_in(tx, documents, options))?;
        log::debug!(
            "inserted {} documents into {} ({} failed)",
            report.keys.len(),
            self.name,
            report.failures.len()
        );
        Ok(report)
    }

    pub(crate) fn insert_in(
        &self,
        tx: &WriteTransaction,
        documents: impl IntoIterator<Item = D>,
        options: InsertOptions,
    ) -> DocumentStoreResult<InsertReport> {
        let mut table = bucket::create(tx, &self.name)?;
        let mut report = InsertReport::default();

        for (index, document) in documents.into_iter().enumerate() {
            match self.insert_document(tx, &mut table, document, options) {
                Ok(key) => report.keys.push(key),
                Err(error) if options.ignore_errors => {
                    log::warn!("skipping document {index} in {}: {error}", self.name);
                    report.failures.push(InsertFailure { index, error });
                }
                Err(error) => return Err(error),
            }
        }
        Ok(report)
    }

    fn insert_document(
        &self,
        tx: &WriteTransaction,
        table: &mut BucketTable<'_>,
        mut document: D,
        options: InsertOptions,
    ) -> DocumentStoreResult<Vec<u8>> {
        if !options.upsert && document.has_key() {
            let key = document.key();
            if table.get(key.as_ref()).map_err(backend)?.is_some() {
                return Err(DocumentStoreError::DocumentExists(display_key(&key), self.name.clone()));
            }
        }

        if let Some(validator) = &self.validator {
            validator.validate(&document)?;
        }
        self.hooks.run(HookEvent::BeforeInsert, &mut document)?;

        let key = self.resolve_key(tx, table, &mut document)?;
        // generated and hook-assigned keys can collide as well
        if !options.upsert && table.get(key.as_slice()).map_err(backend)?.is_some() {
            return Err(DocumentStoreError::DocumentExists(display_key(&key), self.name.clone()));
        }

        let bytes = self.driver.codec().encode(&document)?;
        let previous = table
            .insert(key.as_slice(), bytes.as_slice())
            .map_err(backend)?
            .map(|old| old.value().to_vec());

        if let Err(err) = self.hooks.run(HookEvent::AfterInsert, &mut document) {
            // a failure skipped under ignore_errors must not stay stored
            if let Some(old) = previous {
                table.insert(key.as_slice(), old.as_slice()).map_err(backend)?;
            } else {
                table.remove(key.as_slice()).map_err(backend)?;
            }
            return Err(err);
        }
        Ok(key)
    }

    /// Returns the document's key, generating and assigning one if it has none.
    fn resolve_key(&self, tx: &WriteTransaction, table: &BucketTable<'_>, document: &mut D) -> DocumentStoreResult<Vec<u8>> {
        if document.has_key() {
            return Ok(document.key().into_owned());
        }

        let key = match &self.key_generator {
            Some(generator) => {
                let count = table.len().map_err(backend)?;
                generator.generate(count, document)
            }
            None => sequence_key(bucket::next_sequence(tx, &self.name)?),
        };
        if key.is_empty() {
            log::warn!("key generator for {} returned an empty key", self.name);
            return Err(DocumentStoreError::MissingKey(self.name.clone()));
        }

        document.assign_key(&key);
        Ok(key)
    }

    /// Overwrites a document under its own key, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::BucketNotFound`] if nothing was ever inserted
    /// into this collection.
    pub fn update_one(&self, document: D) -> DocumentStoreResult<()> {
        self.update_many(std::iter::once(document))
    }

    /// Overwrites a batch of documents in one write transaction.
    pub fn update_many(&self, documents: impl IntoIterator<Item = D>) -> DocumentStoreResult<()> {
        let updated = self.driver.write(|tx| {
            let mut table = bucket::open_write(tx, &self.name)?;
            let mut updated = 0;
            for mut document in documents {
                self.store_update(&mut table, None, &mut document)?;
                updated += 1;
            }
            Ok(updated)
        })?;
        log::debug!("updated {updated} documents in {}", self.name);
        Ok(())
    }

    /// Removes a document by its key. Absent keys are not an error.
    pub fn delete_one(&self, document: D) -> DocumentStoreResult<()> {
        self.delete_many(std::iter::once(document))
    }

    /// Removes a batch of documents in one write transaction.
    pub fn delete_many(&self, documents: impl IntoIterator<Item = D>) -> DocumentStoreResult<()> {
        let deleted = self.driver.write(|tx| {
            let mut table = bucket::open_write(tx, &self.name)?;
            let mut deleted = 0;
            for mut document in documents {
                self.store_delete(&mut table, None, &mut document)?;
                deleted += 1;
            }
            Ok(deleted)
        })?;
        log::debug!("deleted {deleted} documents from {}", self.name);
        Ok(())
    }

    /// Walks the bucket newest-first and stores the replacement returned by
    /// `update` under the visited key. `None` leaves the record untouched.
    ///
    /// Returns the number of records rewritten.
    pub fn update_iter<F>(&self, mut update: F) -> DocumentStoreResult<usize>
    where
        F: FnMut(D) -> Option<D>,
    {
        let codec = self.driver.codec();
        let updated = self.driver.write(|tx| {
            let mut table = bucket::open_write(tx, &self.name)?;
            let mut cursor = ReverseCursor::new();
            let mut updated = 0;

            while let Some((key, value)) = cursor.next(&table)? {
                let document: D = codec.decode(&value)?;
                let Some(mut replacement) = update(document) else {
                    continue;
                };
                self.store_update(&mut table, Some(&key), &mut replacement)?;
                updated += 1;
            }
            Ok(updated)
        })?;
        log::debug!("updated {updated} documents in {} by iteration", self.name);
        Ok(updated)
    }

    /// Walks the bucket newest-first and removes every record for which `remove`
    /// returns `true`.
    ///
    /// Returns the number of records removed.
    pub fn delete_iter<F>(&self, mut remove: F) -> DocumentStoreResult<usize>
    where
        F: FnMut(&D) -> bool,
    {
        let codec = self.driver.codec();
        let deleted = self.driver.write(|tx| {
            let mut table = bucket::open_write(tx, &self.name)?;
            let mut cursor = ReverseCursor::new();
            let mut deleted = 0;

            while let Some((key, value)) = cursor.next(&table)? {
                let mut document: D = codec.decode(&value)?;
                if !remove(&document) {
                    continue;
                }
                self.store_delete(&mut table, Some(&key), &mut document)?;
                deleted += 1;
            }
            Ok(deleted)
        })?;
        log::debug!("deleted {deleted} documents from {} by iteration", self.name);
        Ok(deleted)
    }

    /// Removes the bucket, its key sequence and its presence flag.
    ///
    /// Dropping a collection that was never written to only clears the flag.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DropNotPermitted`] unless the driver was
    /// configured with `delete_no_verify` or the collection's drop variable is set.
    pub fn drop(&self) -> DocumentStoreResult<()> {
        if let Err(err) = self.driver.config().check_drop(&self.name) {
            log::warn!("refusing to drop {}: {err}", self.name);
            return Err(err);
        }

        let metadata = self.driver.metadata();
        self.driver.write(|tx| {
            if !bucket::delete(tx, &self.name)? {
                log::debug!("collection {} had no bucket to drop", self.name);
            }
            metadata.insert_in(tx, [metadata::presence(&self.name, false)], InsertOptions::new().upsert())?;
            Ok(())
        })?;
        log::info!("dropped collection {}", self.name);
        Ok(())
    }

    /// Runs the update hooks around storing `document`, under `key` if given and
    /// under the document's own key otherwise.
    ///
    /// Fails with [`DocumentStoreError::MissingKey`] when there is no key to store under.
    pub(crate) fn store_update(&self, table: &mut BucketTable<'_>, key: Option<&[u8]>, document: &mut D) -> DocumentStoreResult<()> {
        self.hooks.run(HookEvent::BeforeUpdate, document)?;
        let key = self.target_key(key, document)?;
        let bytes = self.driver.codec().encode(&*document)?;
        table.insert(key.as_slice(), bytes.as_slice()).map_err(backend)?;
        self.hooks.run(HookEvent::AfterUpdate, document)
    }

    /// Runs the delete hooks around removing `document`, under `key` if given and
    /// under the document's own key otherwise.
    pub(crate) fn store_delete(&self, table: &mut BucketTable<'_>, key: Option<&[u8]>, document: &mut D) -> DocumentStoreResult<()> {
        let key = self.target_key(key, document)?;
        self.hooks.run(HookEvent::BeforeDelete, document)?;
        table.remove(key.as_slice()).map_err(backend)?;
        self.hooks.run(HookEvent::AfterDelete, document)
    }

    fn target_key(&self, key: Option<&[u8]>, document: &D) -> DocumentStoreResult<Vec<u8>> {
        let key = key.map_or_else(|| document.key().into_owned(), <[u8]>::to_vec);
        if key.is_empty() {
            return Err(DocumentStoreError::MissingKey(self.name.clone()));
        }
        Ok(key)
    }
}
