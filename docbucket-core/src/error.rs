//! Error types and result types for document collection operations.
//!
//! This module provides the error vocabulary shared by every layer of the crate.
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use thiserror::Error;

use crate::validate::ValidationError;

/// Represents all recoverable errors that can occur when working with a collection.
///
/// Contract violations (a query carrying both a key list and a predicate, opening a
/// collection on a closed driver) are not represented here: they panic.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A document could not be encoded by the configured codec.
    #[error("Encode error: {0}")]
    Encode(String),
    /// Stored bytes could not be decoded by the configured codec.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Error while opening the underlying store.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document with the given key already exists in the collection.
    /// The first argument is the document key, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentExists(String, String),
    /// The requested document was not found in the collection.
    /// The first argument is the document key (empty for predicate lookups),
    /// the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// A document without a key was about to be written or removed by key.
    /// The argument is the collection name.
    #[error("Document has no key in collection {0}")]
    MissingKey(String),
    /// The bucket backing a collection does not exist.
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),
    /// The document was rejected by the collection's validator.
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
    /// The driver backing this operation has been closed.
    #[error("Transaction closed: the driver is no longer open")]
    TransactionClosed,
    /// Dropping the collection requires an explicit opt-in.
    #[error("Drop not permitted for collection {collection}, set {variable}=true to allow")]
    DropNotPermitted {
        /// The collection that was about to be dropped.
        collection: String,
        /// The environment variable gating the drop.
        variable: String,
    },
    /// The query did not select anything to execute.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// A lifecycle hook refused the operation.
    #[error("Hook error: {0}")]
    Hook(String),
    /// The collection name is reserved for internal use.
    #[error("Collection name {0} is reserved")]
    ReservedName(String),
    /// An error occurred in the underlying storage engine.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Returns `true` if this is a [`DocumentStoreError::DocumentNotFound`] error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::DocumentNotFound(..))
    }

    /// Returns `true` if this is a [`DocumentStoreError::DocumentExists`] error.
    pub fn is_exists(&self) -> bool {
        matches!(self, DocumentStoreError::DocumentExists(..))
    }

    /// Builds a [`DocumentStoreError::Hook`] from anything printable.
    pub fn hook(reason: impl std::fmt::Display) -> Self {
        DocumentStoreError::Hook(reason.to_string())
    }

    /// Builds a [`DocumentStoreError::DocumentNotFound`] for a key.
    pub fn not_found(key: &[u8], collection: &str) -> Self {
        DocumentStoreError::DocumentNotFound(
            String::from_utf8_lossy(key).into_owned(),
            collection.to_string(),
        )
    }
}

/// A specialized `Result` type for document collection operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

/// Renders a key for error messages and logs.
pub fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
