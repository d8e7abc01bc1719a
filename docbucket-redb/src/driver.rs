//! The database handle.
//!
//! A [`Driver`] owns one redb database and hands out typed [`Collection`]s over
//! it. Clones share the same database. Every collection operation runs in its own
//! redb transaction opened through [`Driver::read`] or [`Driver::write`].

use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use redb::{Database, ReadTransaction, ReadableDatabase, WriteTransaction, backends::InMemoryBackend};

use docbucket_core::{
    codec::{Codec, JsonCodec},
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    schema::Schema,
};

use crate::{
    bucket::{backend, is_reserved},
    collection::Collection,
    config::DriverConfig,
};

/// Shared handle to an embedded redb database.
///
/// The codec type `C` decides how documents are turned into stored bytes and
/// defaults to [`JsonCodec`].
///
/// # Example
///
/// ```ignore
/// use docbucket::{Driver, Document};
///
/// let driver = Driver::in_memory()?;
/// let fruits = driver.collection::<Fruit>("fruits")?;
/// fruits.insert(Fruit::new("Apple"))?;
/// driver.close();
/// ```
pub struct Driver<C: Codec = JsonCodec> {
    inner: Arc<DriverInner<C>>,
}

struct DriverInner<C> {
    db: RwLock<Option<Database>>,
    config: DriverConfig,
    codec: C,
}

impl Driver<JsonCodec> {
    /// Opens a database described by `config` using the JSON codec.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if redb cannot open or create
    /// the database.
    pub fn open(config: DriverConfig) -> DocumentStoreResult<Self> {
        Self::with_codec(config, JsonCodec)
    }

    /// Opens a fresh in-memory database using the JSON codec.
    pub fn in_memory() -> DocumentStoreResult<Self> {
        Self::open(DriverConfig::default())
    }
}

impl<C: Codec> Driver<C> {
    /// Opens a database described by `config` using the given codec.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if redb cannot open or create
    /// the database.
    pub fn with_codec(config: DriverConfig, codec: C) -> DocumentStoreResult<Self> {
        let mut builder = Database::builder();
        if let Some(bytes) = config.cache_size {
            builder.set_cache_size(bytes);
        }

        let db = match &config.path {
            Some(path) => builder.create(path),
            None => builder.create_with_backend(InMemoryBackend::new()),
        }
        .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        match &config.path {
            Some(path) => log::debug!("opened database at {}", path.display()),
            None => log::debug!("opened in-memory database"),
        }

        Ok(Self {
            inner: Arc::new(DriverInner {
                db: RwLock::new(Some(db)),
                config,
                codec,
            }),
        })
    }

    /// Opens a typed collection, registering it and its schema in the metadata
    /// store. The backing bucket is created on first insert.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::ReservedName`] for names the driver uses
    /// internally, or any error raised while writing the metadata.
    ///
    /// # Panics
    ///
    /// Panics if the driver has been closed.
    pub fn collection<D: Document>(&self, name: &str) -> DocumentStoreResult<Collection<D, C>> {
        self.collection_with_schema(name, D::schema())
    }

    /// Like [`Driver::collection`], registering `schema` instead of the document
    /// type's own.
    pub fn collection_with_schema<D: Document>(
        &self,
        name: &str,
        schema: Schema,
    ) -> DocumentStoreResult<Collection<D, C>> {
        assert!(!self.is_closed(), "cannot open collection {name}: driver is closed");
        if is_reserved(name) {
            return Err(DocumentStoreError::ReservedName(name.to_string()));
        }

        self.register_collection(name, &schema)?;
        log::debug!("opened collection {name}");
        Ok(Collection::new(self.clone(), name))
    }

    /// Closes the database. Operations on this driver, its clones and its
    /// collections fail with [`DocumentStoreError::TransactionClosed`] afterwards.
    ///
    /// Waits for running transactions to finish. Transactions hold a recursive
    /// read guard, so a pending close never blocks a read nested in a hook.
    pub fn close(&self) {
        if self.inner.db.write().take().is_some() {
            log::debug!("driver closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.db.read_recursive().is_none()
    }

    pub fn codec(&self) -> &C {
        &self.inner.codec
    }

    pub fn config(&self) -> &DriverConfig {
        &self.inner.config
    }

    /// Runs `f` in a read transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::TransactionClosed`] once the driver is closed,
    /// otherwise whatever `f` returns.
    pub fn read<R>(&self, f: impl FnOnce(&ReadTransaction) -> DocumentStoreResult<R>) -> DocumentStoreResult<R> {
        let guard = self.inner.db.read_recursive();
        let db = guard.as_ref().ok_or(DocumentStoreError::TransactionClosed)?;
        let tx = db.begin_read().map_err(backend)?;
        f(&tx)
    }

    /// Runs `f` in a write transaction, committing if it succeeds and rolling back
    /// if it fails.
    ///
    /// Write transactions are serialized by redb. Calling back into the driver for
    /// another write from inside `f` blocks forever. Nested reads are fine, also
    /// while a [`Driver::close`] is waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::TransactionClosed`] once the driver is closed,
    /// the error returned by `f`, or a backend error if the commit fails.
    pub fn write<R>(&self, f: impl FnOnce(&WriteTransaction) -> DocumentStoreResult<R>) -> DocumentStoreResult<R> {
        let guard = self.inner.db.read_recursive();
        let db = guard.as_ref().ok_or(DocumentStoreError::TransactionClosed)?;
        let tx = db.begin_write().map_err(backend)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(|e| {
                    log::error!("commit failed: {e}");
                    backend(e)
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort) = tx.abort() {
                    log::error!("rollback failed after {err}: {abort}");
                }
                Err(err)
            }
        }
    }
}

impl<C: Codec> Clone for Driver<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Codec> fmt::Debug for Driver<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.inner.config)
            .field("codec", &self.inner.codec)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbucket_core::document::Identity;

    #[test]
    fn clones_share_the_database() {
        let driver = Driver::in_memory().unwrap();
        let other = driver.clone();
        driver.close();
        assert!(other.is_closed());
        assert!(matches!(
            other.read(|_| Ok(())),
            Err(DocumentStoreError::TransactionClosed)
        ));
    }

    #[test]
    fn close_is_idempotent() {
        let driver = Driver::in_memory().unwrap();
        driver.close();
        driver.close();
        assert!(matches!(
            driver.write(|_| Ok(())),
            Err(DocumentStoreError::TransactionClosed)
        ));
    }

    #[test]
    fn reserved_names_are_rejected() {
        let driver = Driver::in_memory().unwrap();
        for name in ["__metadata", "__sequences"] {
            let err = driver.collection::<Identity>(name).unwrap_err();
            assert!(matches!(err, DocumentStoreError::ReservedName(n) if n == name));
        }
    }

    #[test]
    #[should_panic(expected = "driver is closed")]
    fn collection_on_closed_driver_panics() {
        let driver = Driver::in_memory().unwrap();
        driver.close();
        let _ = driver.collection::<Identity>("users");
    }

    #[test]
    fn failed_write_rolls_back() {
        let driver = Driver::in_memory().unwrap();
        let result: DocumentStoreResult<()> = driver.write(|tx| {
            crate::bucket::create(tx, "scratch")?;
            Err(DocumentStoreError::hook("refused"))
        });
        assert!(matches!(result, Err(DocumentStoreError::Hook(_))));

        let exists = driver.write(|tx| crate::bucket::exists(tx, "scratch")).unwrap();
        assert!(!exists);
    }
}
