//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Cataloging the primary tree (size index + digest set)
//! - Size pre-filtering of the secondary tree
//! - Parallel hashing of surviving candidates
//!
//! The two phases are strictly sequential: the finder needs the complete
//! catalog before it can classify anything.
//!
//! # Example
//!
//! ```no_run
//! use dirdedupe::duplicates::{DuplicateFinder, ScanConfig};
//! use dirdedupe::scanner::resolve_roots;
//! use std::path::Path;
//!
//! let roots = resolve_roots(Path::new("/backup1"), Path::new("/backup2"))?;
//! let finder = DuplicateFinder::new(ScanConfig::default().with_workers(4))?;
//! let outcome = finder.scan(&roots)?;
//! for path in &outcome.duplicates {
//!     println!("duplicate: {}", path.display());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod finder;
pub mod pool;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::progress::ProgressCallback;
use crate::scanner::{resolves_within, FileRecord, HashAlgorithm, ScanError, WalkerConfig};

pub use catalog::{Catalog, CatalogBuilder, CatalogStats};
pub use finder::{DuplicateFinder, FinderStats, ScanOutcome};
pub use pool::{default_workers, HashOutcome, HashPool};

/// Paths in the secondary tree whose content exists in the primary tree,
/// in discovery order.
pub type DuplicateList = Vec<PathBuf>;

/// Configuration shared by the catalog builder and the duplicate finder.
#[derive(Clone)]
pub struct ScanConfig {
    /// Number of hashing workers.
    pub workers: usize,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Traversal options applied to both trees.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanConfig")
            .field("workers", &self.workers)
            .field("algorithm", &self.algorithm)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            algorithm: HashAlgorithm::default(),
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ScanConfig {
    /// Set the number of hashing workers (minimum 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the traversal options.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Canonical `root` when the walk follows symlinks, `None` otherwise.
///
/// A followed link can lead anywhere; records whose real location is not
/// inside this root are dropped before they are cataloged or classified.
pub(crate) fn containment_root(
    config: &ScanConfig,
    root: &Path,
) -> Result<Option<PathBuf>, FinderError> {
    if !config.walker_config.follow_symlinks {
        return Ok(None);
    }
    std::fs::canonicalize(root)
        .map(Some)
        .map_err(|e| FinderError::RootUnreadable(ScanError::from_io(root.to_path_buf(), e)))
}

/// Keep `file` only if it really lives inside `real_root`.
///
/// `Ok(None)` means the record was reached through a link that leads out of
/// the tree.
pub(crate) fn contain(
    real_root: Option<&Path>,
    file: FileRecord,
) -> Result<Option<FileRecord>, ScanError> {
    let Some(real_root) = real_root else {
        return Ok(Some(file));
    };
    match resolves_within(&file.path, real_root) {
        Ok(true) => Ok(Some(file)),
        Ok(false) => {
            log::debug!(
                "Skipping {}: resolves outside {}",
                file.path.display(),
                real_root.display()
            );
            Ok(None)
        }
        Err(e) => Err(ScanError::from_io(file.path, e)),
    }
}

/// Errors that abort a scan.
///
/// Per-file problems never show up here; they are counted in the phase
/// statistics instead.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A root directory could not be listed.
    #[error("Cannot read root directory: {0}")]
    RootUnreadable(#[source] ScanError),

    /// The hashing pool could not be started.
    #[error("Failed to start hashing workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
