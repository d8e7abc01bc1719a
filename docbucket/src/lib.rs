//! Typed document collections over an embedded ordered key-value store.
//!
//! This crate is the primary entry point for users of docbucket. It re-exports the
//! core types from `docbucket-core`, the redb storage engine from `docbucket-redb`
//! and the `#[derive(Document)]` macro.
//!
//! # Features
//!
//! - **Typed collections** - Store any Serde type that names its key field
//! - **Pluggable codecs** - JSON by default, BSON via [`codec::BsonCodec`]
//! - **Newest-first queries** - Predicate scans with visit-based pagination, or key lookups
//! - **Atomic mutations** - Batches, hooks and key sequences commit in one transaction
//! - **Metadata** - Registered collections and their field aliases
//!
//! # Quick Start
//!
//! ```ignore
//! use docbucket::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Document)]
//! pub struct Fruit {
//!     #[document(key)]
//!     #[serde(rename = "_id", default)]
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! fn main() -> DocumentStoreResult<()> {
//!     let driver = Driver::in_memory()?;
//!     let fruits = driver.collection::<Fruit>("fruits")?;
//!
//!     fruits.insert(Fruit { id: String::new(), name: "Apple".into() })?;
//!     fruits.insert(Fruit { id: String::new(), name: "Pineapple".into() })?;
//!
//!     let result = fruits.query(Query::filter(|f: &Fruit| f.name.starts_with('P')));
//!     println!("{:?} next={}", result.items(), result.next());
//!
//!     driver.close();
//!     Ok(())
//! }
//! ```
//!
//! # Dropping collections
//!
//! Dropping is gated. Either open the driver with
//! [`DriverConfig::delete_no_verify`](redb::DriverConfig) or set
//! `DOCBUCKET_ALLOW_DROP_<NAME>=true` in the environment.
//!
//! ```ignore
//! use docbucket::prelude::*;
//!
//! let driver = Driver::open(DriverConfig::builder().delete_no_verify(true).build())?;
//! let fruits = driver.collection::<Fruit>("fruits")?;
//! fruits.drop()?;
//! assert!(driver.get_collections()?.is_empty());
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbucket;

pub mod prelude;

pub use docbucket_core::{codec, document, error, hooks, key, page, query, schema, validate};
pub use docbucket_macros::Document;

pub use docbucket_redb::{Collection, Driver, DriverConfig, QueryResult};

/// The redb storage engine.
pub mod redb {
    pub use docbucket_redb::{
        Collection, Driver, DriverConfig, DriverConfigBuilder, InsertFailure, InsertOptions, InsertReport,
        MetadataRecord, QueryResult,
        cursor::{ReverseCursor, reverse_for_each},
        metadata::{COLLECTION_PREFIX, FIELDS_PREFIX, METADATA_COLLECTION},
    };
}

// Re-export serialization crates for convenience
pub use bson;
pub use serde_json;
