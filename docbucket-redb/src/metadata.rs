//! Driver-wide metadata.
//!
//! Metadata is an ordinary collection named `__metadata` holding
//! [`MetadataRecord`]s keyed by their `k` field. The driver keeps two kinds of
//! entries there:
//!
//! - `collection:<name>`: `true` while the collection exists, `false` once dropped
//! - `__fields:<name>`: the collection's field aliases as `"name;serialized"` strings
//!
//! Applications may store their own entries through [`Driver::write_metadata`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use docbucket_core::{
    codec::Codec,
    document::{Document, Keyed},
    error::{DocumentStoreError, DocumentStoreResult},
    schema::{FieldAlias, Schema},
};

use crate::{collection::Collection, driver::Driver, mutation::InsertOptions};

/// Name of the reserved metadata collection.
pub const METADATA_COLLECTION: &str = "__metadata";
/// Key prefix of collection presence flags.
pub const COLLECTION_PREFIX: &str = "collection:";
/// Key prefix of field alias lists.
pub const FIELDS_PREFIX: &str = "__fields:";

/// A single metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(rename = "k")]
    pub key: String,
    #[serde(rename = "v")]
    pub value: Value,
}

impl MetadataRecord {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

impl Keyed for MetadataRecord {
    fn key(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.key.as_bytes())
    }
}

impl Document for MetadataRecord {
    fn assign_key(&mut self, key: &[u8]) {
        self.key = String::from_utf8_lossy(key).into_owned();
    }
}

pub(crate) fn presence(collection: &str, present: bool) -> MetadataRecord {
    MetadataRecord::new(format!("{COLLECTION_PREFIX}{collection}"), present)
}

fn fields(collection: &str, schema: &Schema) -> MetadataRecord {
    MetadataRecord::new(format!("{FIELDS_PREFIX}{collection}"), schema.encode())
}

impl<C: Codec> Driver<C> {
    pub(crate) fn metadata(&self) -> Collection<MetadataRecord, C> {
        Collection::new(self.clone(), METADATA_COLLECTION)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn write_metadata(&self, key: &str, value: impl Into<Value>) -> DocumentStoreResult<()> {
        self.metadata()
            .insert_with(MetadataRecord::new(key, value), InsertOptions::new().upsert())
            .map(|_| ())
    }

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`] if `key` was never written.
    pub fn read_metadata(&self, key: &str) -> DocumentStoreResult<Value> {
        self.metadata().find_by_key(key).map(|record| record.value)
    }

    /// Names of the collections currently flagged present, sorted.
    pub fn get_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let flagged = |record: &MetadataRecord| {
            record.key.starts_with(COLLECTION_PREFIX) && record.value == Value::Bool(true)
        };

        let matches = match self.metadata().scan(&flagged, 0, 0) {
            Ok(matches) => matches,
            Err(DocumentStoreError::BucketNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names: Vec<String> = matches
            .documents
            .into_iter()
            .filter_map(|record| record.key.strip_prefix(COLLECTION_PREFIX).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Field aliases registered for `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentNotFound`] if the collection was never
    /// opened and [`DocumentStoreError::Decode`] if the stored entry is not a list
    /// of strings.
    pub fn fields_of(&self, collection: &str) -> DocumentStoreResult<Vec<FieldAlias>> {
        match self.read_metadata(&format!("{FIELDS_PREFIX}{collection}"))? {
            Value::Array(entries) => entries
                .iter()
                .map(|entry| {
                    entry
                        .as_str()
                        .map(FieldAlias::decode)
                        .ok_or_else(|| DocumentStoreError::Decode(format!("unknown field entry {entry}")))
                })
                .collect(),
            other => Err(DocumentStoreError::Decode(format!("unknown field structure {other}"))),
        }
    }

    /// Flags `collection` present and records its field aliases.
    pub(crate) fn register_collection(&self, collection: &str, schema: &Schema) -> DocumentStoreResult<()> {
        let metadata = self.metadata();
        self.write(|tx| {
            metadata.insert_in(
                tx,
                [presence(collection, true), fields(collection, schema)],
                InsertOptions::new().upsert(),
            )?;
            Ok(())
        })
    }
}
