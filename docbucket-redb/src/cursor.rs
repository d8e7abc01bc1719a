//! Descending traversal over a bucket.
//!
//! [`ReverseCursor`] walks a table from its greatest key down to its smallest.
//! Each step seeks strictly below the key returned by the previous step instead of
//! holding a live iterator, so the caller may overwrite or delete the record it is
//! currently visiting between steps without disturbing the traversal.

use redb::ReadableTable;

use docbucket_core::{error::DocumentStoreResult, query::Flow};

use crate::bucket::backend;

/// A key/value pair copied out of a bucket.
pub type Entry = (Vec<u8>, Vec<u8>);

/// Restartable descending cursor. A new cursor starts at the greatest key.
#[derive(Debug, Default, Clone)]
pub struct ReverseCursor {
    upper: Option<Vec<u8>>,
    exhausted: bool,
}

impl ReverseCursor {
    /// Creates a cursor positioned before the greatest key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next entry in descending key order, or `None` once the smallest
    /// key has been returned.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Backend`](docbucket_core::error::DocumentStoreError::Backend)
    /// if the table cannot be read.
    pub fn next<T>(&mut self, table: &T) -> DocumentStoreResult<Option<Entry>>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        if self.exhausted {
            return Ok(None);
        }

        let entry = match &self.upper {
            None => table
                .last()
                .map_err(backend)?
                .map(|(k, v)| (k.value().to_vec(), v.value().to_vec())),
            Some(upper) => match table.range(..upper.as_slice()).map_err(backend)?.next_back() {
                Some(item) => {
                    let (k, v) = item.map_err(backend)?;
                    Some((k.value().to_vec(), v.value().to_vec()))
                }
                None => None,
            },
        };

        match &entry {
            Some((key, _)) => self.upper = Some(key.clone()),
            None => self.exhausted = true,
        }
        Ok(entry)
    }
}

/// Visits every entry in descending key order until `visit` returns [`Flow::Stop`].
///
/// `visit` receives the 1-based position of the entry. Returns the number of
/// entries visited, including the one that stopped the traversal.
pub fn reverse_for_each<T, F>(table: &T, mut visit: F) -> DocumentStoreResult<usize>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
    F: FnMut(usize, &[u8], &[u8]) -> DocumentStoreResult<Flow>,
{
    let mut cursor = ReverseCursor::new();
    let mut visited = 0;
    while let Some((key, value)) = cursor.next(table)? {
        visited += 1;
        if visit(visited, &key, &value)? == Flow::Stop {
            break;
        }
    }
    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::{Database, ReadableDatabase, backends::InMemoryBackend};

    use crate::bucket::definition;

    fn database(keys: &[&str]) -> Database {
        let db = Database::builder().create_with_backend(InMemoryBackend::new()).unwrap();
        let tx = db.begin_write().unwrap();
        {
            let mut table = tx.open_table(definition("fruits")).unwrap();
            for key in keys {
                table.insert(key.as_bytes(), key.to_uppercase().as_bytes()).unwrap();
            }
        }
        tx.commit().unwrap();
        db
    }

    #[test]
    fn walks_keys_in_descending_order() {
        let db = database(&["b", "a", "c"]);
        let tx = db.begin_read().unwrap();
        let table = tx.open_table(definition("fruits")).unwrap();

        let mut seen = Vec::new();
        let visited = reverse_for_each(&table, |position, key, value| {
            seen.push((position, key.to_vec(), value.to_vec()));
            Ok(Flow::Continue)
        })
        .unwrap();

        assert_eq!(visited, 3);
        assert_eq!(
            seen,
            vec![
                (1, b"c".to_vec(), b"C".to_vec()),
                (2, b"b".to_vec(), b"B".to_vec()),
                (3, b"a".to_vec(), b"A".to_vec()),
            ]
        );
    }

    #[test]
    fn stop_counts_the_stopping_entry() {
        let db = database(&["a", "b", "c", "d"]);
        let tx = db.begin_read().unwrap();
        let table = tx.open_table(definition("fruits")).unwrap();

        let visited = reverse_for_each(&table, |position, _, _| {
            Ok(if position == 2 { Flow::Stop } else { Flow::Continue })
        })
        .unwrap();
        assert_eq!(visited, 2);
    }

    #[test]
    fn empty_bucket_visits_nothing() {
        let db = database(&[]);
        let tx = db.begin_read().unwrap();
        let table = tx.open_table(definition("fruits")).unwrap();

        let mut cursor = ReverseCursor::new();
        assert!(cursor.next(&table).unwrap().is_none());
        assert!(cursor.next(&table).unwrap().is_none());
    }

    #[test]
    fn tolerates_mutating_the_current_record() {
        let db = database(&["a", "b", "c", "d"]);
        let tx = db.begin_write().unwrap();
        {
            let mut table = tx.open_table(definition("fruits")).unwrap();
            let mut cursor = ReverseCursor::new();
            let mut order = Vec::new();
            while let Some((key, _)) = cursor.next(&table).unwrap() {
                order.push(key.clone());
                if key == b"c" || key == b"a" {
                    table.remove(key.as_slice()).unwrap();
                } else {
                    table.insert(key.as_slice(), b"seen".as_slice()).unwrap();
                }
            }
            assert_eq!(order, vec![b"d".to_vec(), b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
        }
        tx.commit().unwrap();

        let tx = db.begin_read().unwrap();
        let table = tx.open_table(definition("fruits")).unwrap();
        let mut remaining = Vec::new();
        reverse_for_each(&table, |_, key, value| {
            remaining.push((key.to_vec(), value.to_vec()));
            Ok(Flow::Continue)
        })
        .unwrap();
        assert_eq!(remaining, vec![(b"d".to_vec(), b"seen".to_vec()), (b"b".to_vec(), b"seen".to_vec())]);
    }
}
