//! redb storage engine for docbucket.
//!
//! This crate stores typed documents in an embedded [redb](https://docs.rs/redb)
//! database. Each collection is one redb table mapping key bytes to documents
//! encoded by the driver's [`Codec`](docbucket_core::codec::Codec).
//!
//! # Features
//!
//! - **Newest-first scans** - Predicate queries walk keys in descending order
//! - **Visit-based pagination** - `next` counts records visited, not matched
//! - **Atomic batches** - Every operation runs in a single redb transaction
//! - **Lifecycle hooks** - Before/after hooks for inserts, updates and deletes
//! - **Metadata** - Collection presence flags and field aliases in `__metadata`
//!
//! # Quick Start
//!
//! ```ignore
//! use docbucket_redb::{Driver, DriverConfig};
//! use docbucket_core::query::{FindOptions, Query};
//!
//! let driver = Driver::open(DriverConfig::builder().path("fruits.redb").build())?;
//! let fruits = driver.collection::<Fruit>("fruits")?;
//!
//! fruits.insert_many(["Apple", "Banana", "Cherry", "Pineapple"].map(Fruit::new))?;
//!
//! let page = fruits
//!     .query(Query::builder().filter(|f: &Fruit| f.name.starts_with('P')).build())
//!     .page();
//! assert_eq!(page.next, 4);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbucket_redb;

pub mod bucket;
pub mod collection;
pub mod config;
pub mod cursor;
pub mod driver;
pub mod metadata;
pub mod mutation;
pub mod result;

pub use collection::Collection;
pub use config::{DriverConfig, DriverConfigBuilder};
pub use driver::Driver;
pub use metadata::MetadataRecord;
pub use mutation::{InsertFailure, InsertOptions, InsertReport};
pub use result::QueryResult;


#[cfg(test)]
#[ctor::ctor]
fn init_logging() {
    colog::init();
}
