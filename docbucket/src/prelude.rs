//! Convenient re-exports of commonly used types from docbucket.
//!
//! ```ignore
//! use docbucket::prelude::*;
//! ```
//!
//! This provides access to:
//! - The driver, its configuration and typed collections
//! - Document traits and the derive macro
//! - Query construction and results
//! - Codecs, key generators, hooks and validators
//! - Error types

pub use docbucket_core::{
    codec::{BsonCodec, Codec, JsonCodec},
    document::{Document, Identity, KeyField, Keyed},
    error::{DocumentStoreError, DocumentStoreResult},
    hooks::HookEvent,
    key::{KeyGenerator, UuidKeys},
    page::Page,
    query::{FindOptions, Query, QueryBuilder},
    schema::{FieldAlias, Schema},
    validate::{ValidationError, Validator},
};
pub use docbucket_macros::Document;
pub use docbucket_redb::{
    Collection, Driver, DriverConfig, InsertOptions, InsertReport, QueryResult,
};
