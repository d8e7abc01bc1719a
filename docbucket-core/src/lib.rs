//! Store-agnostic building blocks for typed document collections.
//!
//! This crate is the core of the docbucket project and provides:
//!
//! - **Document traits** ([`document`]) - Identity and serialization bounds for stored types
//! - **Codecs** ([`codec`]) - Pluggable encoding of documents into stored bytes
//! - **Queries** ([`query`]) - Predicate and key-list query descriptors with pagination
//! - **Hooks** ([`hooks`]) - Before/after lifecycle hooks for mutations
//! - **Validation** ([`validate`]) - Per-insert document validation
//! - **Key generation** ([`key`]) - Sequence and UUID keys for unkeyed documents
//! - **Schema descriptions** ([`schema`]) - Field alias lists for introspection
//! - **Pages** ([`page`]) - Serializable paginated responses
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! The storage engine lives in `docbucket-redb`.

#[allow(unused_extern_crates)]
extern crate self as docbucket_core;

pub mod codec;
pub mod document;
pub mod error;
pub mod hooks;
pub mod key;
pub mod page;
pub mod query;
pub mod schema;
pub mod validate;
