//! Core traits for document identity and storage.
//!
//! Every stored type implements [`Keyed`] (its identity bytes) and [`Document`]
//! (serialisation bounds, key write-back and an optional schema description).
//! The `#[derive(Document)]` macro from the facade crate generates both.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::borrow::Cow;

use crate::schema::Schema;

/// Exposes the identity bytes of a document.
///
/// An empty key means the document has not been assigned one yet; the collection
/// generates a key at insert time and writes it back via [`Document::assign_key`].
pub trait Keyed {
    /// Returns the key this document is stored under.
    fn key(&self) -> Cow<'_, [u8]>;

    /// Returns `true` once a key has been assigned.
    fn has_key(&self) -> bool {
        !self.key().is_empty()
    }
}

/// Core trait that all documents stored in a collection must implement.
///
/// # Example
///
/// ```ignore
/// use docbucket::document::{Document, Keyed};
/// use serde::{Serialize, Deserialize};
/// use std::borrow::Cow;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Fruit {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl Keyed for Fruit {
///     fn key(&self) -> Cow<'_, [u8]> {
///         Cow::Borrowed(self.id.as_bytes())
///     }
/// }
///
/// impl Document for Fruit {
///     fn assign_key(&mut self, key: &[u8]) {
///         self.id = String::from_utf8_lossy(key).into_owned();
///     }
/// }
/// ```
pub trait Document: Keyed + Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Writes a generated key back into the document's identity field.
    fn assign_key(&mut self, key: &[u8]);

    /// Describes the document's fields for schema introspection.
    ///
    /// Registered in the metadata store when a collection is opened.
    fn schema() -> Schema {
        Schema::default()
    }
}

/// A field type that can hold a document key.
///
/// Used by the derive macro so that the key field may be a `String`, raw bytes
/// or an embedded [`Identity`].
pub trait KeyField {
    /// Returns the key bytes held by this field.
    fn as_key(&self) -> &[u8];

    /// Replaces the key held by this field.
    fn set_key(&mut self, key: &[u8]);
}

impl KeyField for String {
    fn as_key(&self) -> &[u8] {
        self.as_bytes()
    }

    fn set_key(&mut self, key: &[u8]) {
        *self = String::from_utf8_lossy(key).into_owned();
    }
}

impl KeyField for Vec<u8> {
    fn as_key(&self) -> &[u8] {
        self
    }

    fn set_key(&mut self, key: &[u8]) {
        self.clear();
        self.extend_from_slice(key);
    }
}

/// Embeddable identity serialized as `_id`.
///
/// Flatten it into a document struct to get the conventional identity field:
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize, Document)]
/// pub struct Fruit {
///     #[serde(flatten)]
///     #[document(key)]
///     pub identity: Identity,
///     pub name: String,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// The document key as text.
    #[serde(rename = "_id", default)]
    pub id: String,
}

impl Identity {
    /// Creates an identity with the given key.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl KeyField for Identity {
    fn as_key(&self) -> &[u8] {
        self.id.as_bytes()
    }

    fn set_key(&mut self, key: &[u8]) {
        self.id.set_key(key);
    }
}

impl Keyed for Identity {
    fn key(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_key())
    }
}

impl Document for Identity {
    fn assign_key(&mut self, key: &[u8]) {
        self.set_key(key);
    }
}
