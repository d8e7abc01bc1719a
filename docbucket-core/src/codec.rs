//! Pluggable document encoding.
//!
//! A [`Codec`] turns documents into the bytes stored in a bucket and back. The
//! driver is generic over its codec, so a database written with one codec must be
//! read with the same one.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Serialize/deserialize capability for stored documents.
pub trait Codec: Send + Sync + Debug + Clone + Default + 'static {
    /// Encodes a value into its stored byte form.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> DocumentStoreResult<Vec<u8>>;

    /// Decodes a value from its stored byte form.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Decode`] if the bytes do not describe a `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> DocumentStoreResult<T>;
}

/// JSON codec backed by `serde_json`. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> DocumentStoreResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| DocumentStoreError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> DocumentStoreResult<T> {
        serde_json::from_slice(bytes).map_err(|e| DocumentStoreError::Decode(e.to_string()))
    }
}

/// BSON codec backed by the `bson` crate.
///
/// Documents must serialize to a BSON document (a struct or a map).
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonCodec;

impl Codec for BsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> DocumentStoreResult<Vec<u8>> {
        bson::serialize_to_vec(value).map_err(|e| DocumentStoreError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> DocumentStoreResult<T> {
        bson::deserialize_from_slice(bytes).map_err(|e| DocumentStoreError::Decode(e.to_string()))
    }
}
