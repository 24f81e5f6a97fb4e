//! Result cache for a pair of trees.
//!
//! A run can persist its final duplicate list so the next run over the same
//! pair of directories skips both scanning phases. The cache stores only
//! the duplicate list, never the primary catalog.
//!
//! # Validity
//!
//! A cached record is reused only if all of the following hold:
//! * the file exists and parses as a [`CacheRecord`]
//! * its version (when present) is one this build understands
//! * its primary and secondary paths equal the current resolved roots
//! * every listed duplicate still exists on disk
//!
//! Anything else discards the record in full; see [`CacheMiss`] for the
//! reasons reported. There is no partial reuse.

pub mod record;
pub mod store;

pub use record::{CacheRecord, CACHE_VERSION};
pub use store::{CacheLookup, CacheMiss, ResultCache};

use std::path::PathBuf;
use std::sync::Arc;

/// Errors raised while writing a cache file.
///
/// Reading never fails with an error; problems on load become a
/// [`CacheMiss`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CacheError {
    /// Filesystem failure while writing.
    #[error("Failed to write cache {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The record could not be serialized.
    #[error("Failed to serialize cache: {0}")]
    Serialize(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}

/// Result type for cache writes.
pub type CacheResult<T> = Result<T, CacheError>;
