//! Bucket access on top of redb tables.
//!
//! Every collection is one redb table mapping key bytes to encoded document bytes.
//! A separate `__sequences` table keeps the per-collection counters used to
//! generate keys.

use std::fmt::Display;

use redb::{
    ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, TableError, TableHandle, WriteTransaction,
};

use docbucket_core::error::{DocumentStoreError, DocumentStoreResult};

use crate::metadata::METADATA_COLLECTION;

/// Name of the table holding key sequences.
pub const SEQUENCE_TABLE: &str = "__sequences";

pub(crate) type BucketDefinition<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;
pub(crate) type BucketTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;
pub(crate) type ReadBucket = ReadOnlyTable<&'static [u8], &'static [u8]>;

const SEQUENCES: TableDefinition<'static, &'static str, u64> = TableDefinition::new(SEQUENCE_TABLE);

/// Returns `true` for table names the driver keeps for itself.
pub fn is_reserved(name: &str) -> bool {
    name == METADATA_COLLECTION || name == SEQUENCE_TABLE
}

pub(crate) fn definition(name: &str) -> BucketDefinition<'_> {
    TableDefinition::new(name)
}

pub(crate) fn backend<E: Display>(err: E) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

/// Opens a bucket for reading, reporting a missing table as [`DocumentStoreError::BucketNotFound`].
pub(crate) fn open_read(tx: &ReadTransaction, name: &str) -> DocumentStoreResult<ReadBucket> {
    match tx.open_table(definition(name)) {
        Ok(table) => Ok(table),
        Err(TableError::TableDoesNotExist(_)) => Err(DocumentStoreError::BucketNotFound(name.to_string())),
        Err(e) => Err(backend(e)),
    }
}

pub(crate) fn exists(tx: &WriteTransaction, name: &str) -> DocumentStoreResult<bool> {
    Ok(tx.list_tables().map_err(backend)?.any(|table| table.name() == name))
}

/// Opens an existing bucket for writing. Write transactions would otherwise
/// create the table on open.
pub(crate) fn open_write<'txn>(tx: &'txn WriteTransaction, name: &str) -> DocumentStoreResult<BucketTable<'txn>> {
    if !exists(tx, name)? {
        return Err(DocumentStoreError::BucketNotFound(name.to_string()));
    }
    tx.open_table(definition(name)).map_err(backend)
}

/// Opens a bucket for writing, creating it if needed.
pub(crate) fn create<'txn>(tx: &'txn WriteTransaction, name: &str) -> DocumentStoreResult<BucketTable<'txn>> {
    tx.open_table(definition(name)).map_err(backend)
}

/// Removes a bucket and its key sequence. Returns `false` if there was no bucket.
pub(crate) fn delete(tx: &WriteTransaction, name: &str) -> DocumentStoreResult<bool> {
    let existed = tx.delete_table(definition(name)).map_err(backend)?;
    let mut sequences = tx.open_table(SEQUENCES).map_err(backend)?;
    sequences.remove(name).map_err(backend)?;
    Ok(existed)
}

/// Advances and returns the key sequence of a bucket. The first value is 1.
pub(crate) fn next_sequence(tx: &WriteTransaction, name: &str) -> DocumentStoreResult<u64> {
    let mut sequences = tx.open_table(SEQUENCES).map_err(backend)?;
    let current = sequences.get(name).map_err(backend)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    sequences.insert(name, next).map_err(backend)?;
    Ok(next)
}
