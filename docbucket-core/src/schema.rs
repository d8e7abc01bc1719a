//! Schema descriptions recorded in the metadata store.
//!
//! A [`Schema`] lists the fields of a document type together with the name each
//! field is serialized under. It is stored as a list of `primary;serialized`
//! strings so external tooling can map between the two.

use serde::{Deserialize, Serialize};

/// Separator between the primary and the serialized name of a field.
pub const FIELD_ALIAS_SEPARATOR: &str = ";";

/// One field of a document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAlias {
    /// Field name in the source type.
    pub name: String,
    /// Name the codec writes the field under.
    pub serialized: String,
}

impl FieldAlias {
    /// Creates an alias pair.
    pub fn new(name: impl Into<String>, serialized: impl Into<String>) -> Self {
        Self { name: name.into(), serialized: serialized.into() }
    }

    /// Creates a field whose serialized name equals its primary name.
    pub fn plain(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { serialized: name.clone(), name }
    }

    /// Renders the `primary;serialized` storage form.
    pub fn encode(&self) -> String {
        format!("{}{FIELD_ALIAS_SEPARATOR}{}", self.name, self.serialized)
    }

    /// Parses the storage form. An entry without a separator names a field whose
    /// serialized name equals its primary name.
    pub fn decode(entry: &str) -> Self {
        match entry.split_once(FIELD_ALIAS_SEPARATOR) {
            Some((name, serialized)) => Self::new(name, serialized),
            None => Self::plain(entry),
        }
    }
}

/// Ordered list of field aliases for a document type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Fields in declaration order.
    pub fields: Vec<FieldAlias>,
}

impl Schema {
    /// Creates a schema from its fields.
    pub fn new(fields: Vec<FieldAlias>) -> Self {
        Self { fields }
    }

    /// Appends a field and returns the schema, for fluent construction.
    pub fn with_field(mut self, name: impl Into<String>, serialized: impl Into<String>) -> Self {
        self.fields.push(FieldAlias::new(name, serialized));
        self
    }

    /// Renders every field in storage form.
    pub fn encode(&self) -> Vec<String> {
        self.fields.iter().map(FieldAlias::encode).collect()
    }

    /// Parses a list of storage-form entries.
    pub fn decode<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(entries.into_iter().map(|e| FieldAlias::decode(e.as_ref())).collect())
    }

    /// Returns `true` if the schema lists no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
