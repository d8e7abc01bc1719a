//! Driver configuration.

use std::path::{Path, PathBuf};

use docbucket_core::error::{DocumentStoreError, DocumentStoreResult};

/// Prefix of the environment variables that gate collection drops.
pub const DEFAULT_DROP_ENV_PREFIX: &str = "DOCBUCKET";

/// Options for opening a [`Driver`](crate::Driver).
///
/// With no `path` the database lives in memory and disappears when the driver is
/// closed or dropped.
///
/// # Example
///
/// ```ignore
/// use docbucket_redb::{Driver, DriverConfig};
///
/// let config = DriverConfig::builder()
///     .path("fruits.redb")
///     .delete_no_verify(true)
///     .build();
///
/// let driver = Driver::open(config)?;
/// ```
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// File backing the database. `None` keeps everything in memory.
    pub path: Option<PathBuf>,
    /// Skips the environment check when dropping collections.
    pub delete_no_verify: bool,
    /// Prefix of the `<PREFIX>_ALLOW_DROP_<NAME>` environment variables.
    pub drop_env_prefix: String,
    /// Page cache size in bytes handed to redb.
    pub cache_size: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            path: None,
            delete_no_verify: false,
            drop_env_prefix: DEFAULT_DROP_ENV_PREFIX.to_string(),
            cache_size: None,
        }
    }
}

impl DriverConfig {
    /// Creates a configuration for an in-memory database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder starting from the defaults.
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// Name of the environment variable that allows dropping `collection`.
    pub fn drop_variable(&self, collection: &str) -> String {
        format!("{}_ALLOW_DROP_{}", self.drop_env_prefix, collection.to_uppercase())
    }

    /// Checks whether `collection` may be dropped.
    ///
    /// Passes when `delete_no_verify` is set or when the collection's drop variable
    /// holds `true`, `1` or `yes` in any letter case.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DropNotPermitted`] naming the variable to set.
    pub fn check_drop(&self, collection: &str) -> DocumentStoreResult<()> {
        if self.delete_no_verify {
            return Ok(());
        }

        let variable = self.drop_variable(collection);
        match std::env::var(&variable) {
            Ok(value) if is_truthy(&value) => Ok(()),
            _ => Err(DocumentStoreError::DropNotPermitted {
                collection: collection.to_string(),
                variable,
            }),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Builder for [`DriverConfig`].
#[derive(Debug, Default)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// Stores the database in the given file, creating it if needed.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Allows dropping collections without the environment opt-in.
    pub fn delete_no_verify(mut self, delete_no_verify: bool) -> Self {
        self.config.delete_no_verify = delete_no_verify;
        self
    }

    /// Overrides the prefix of the drop-gating environment variables.
    pub fn drop_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.drop_env_prefix = prefix.into();
        self
    }

    /// Sets the redb page cache size in bytes.
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config.cache_size = Some(bytes);
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> DriverConfig {
        self.config
    }
}
