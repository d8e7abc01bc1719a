//! Key generation for documents inserted without a key.

use uuid::Uuid;

/// Width of keys rendered from a sequence number. `u64::MAX` has 20 digits.
pub const SEQUENCE_KEY_WIDTH: usize = 20;

/// Renders a sequence number as a fixed-width decimal key.
///
/// Fixed width keeps byte order equal to numeric order, so a descending scan
/// visits the most recently inserted documents first.
pub fn sequence_key(sequence: u64) -> Vec<u8> {
    format!("{sequence:0width$}", width = SEQUENCE_KEY_WIDTH).into_bytes()
}

/// Produces keys for documents inserted without one.
///
/// `count` is the number of records currently in the bucket. The generator may
/// also update the document itself; the returned key is written back into the
/// identity field by the collection regardless.
///
/// Implemented for any `Fn(u64, &mut D) -> Vec<u8>` closure.
pub trait KeyGenerator<D>: Send + Sync {
    /// Returns the key for `document`.
    fn generate(&self, count: u64, document: &mut D) -> Vec<u8>;
}

impl<D, F> KeyGenerator<D> for F
where
    F: Fn(u64, &mut D) -> Vec<u8> + Send + Sync,
{
    fn generate(&self, count: u64, document: &mut D) -> Vec<u8> {
        self(count, document)
    }
}

/// Generates random v4 UUID keys in their hyphenated text form.
///
/// UUID keys carry no ordering, so descending scans no longer follow
/// insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeys;

impl<D> KeyGenerator<D> for UuidKeys {
    fn generate(&self, _count: u64, _document: &mut D) -> Vec<u8> {
        Uuid::new_v4().hyphenated().to_string().into_bytes()
    }
}
