//! Catalog of the primary tree.
//!
//! # Overview
//!
//! The catalog answers two questions about the primary tree:
//! 1. Is there any primary file of size `n`? (size index, used as a pre-filter)
//! 2. Does any primary file have digest `d`? (digest set, the actual test)
//!
//! Building it is a two-step process: enumerate the tree sequentially,
//! recording each file in the size index, then hash every file on the
//! worker pool and collect the successful digests into a set. Files that
//! fail to hash stay in the size index but never contribute a digest.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::pool::HashPool;
use super::{contain, containment_root, FinderError, ScanConfig};
use crate::progress::{Phase, ProgressCounters};
use crate::scanner::{Digest, FileRecord, HashAlgorithm, Hasher, ScanError, Walker};

/// Size index and digest set of the primary tree.
///
/// Immutable once built; owned by the run that built it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    algorithm: HashAlgorithm,
    digests: HashSet<Digest>,
    size_index: HashMap<u64, Vec<PathBuf>>,
}

impl Catalog {
    /// Assemble a catalog from already-hashed records.
    ///
    /// Records without a digest are indexed by size only.
    #[must_use]
    pub fn from_records<I>(algorithm: HashAlgorithm, records: I) -> Self
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let mut catalog = Self {
            algorithm,
            ..Self::default()
        };
        for record in records {
            if let Some(digest) = record.digest {
                catalog.digests.insert(digest);
            }
            catalog
                .size_index
                .entry(record.size)
                .or_default()
                .push(record.path);
        }
        catalog
    }

    /// Algorithm the digests were computed with.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether any primary file has this size.
    #[must_use]
    pub fn has_size(&self, size: u64) -> bool {
        self.size_index.contains_key(&size)
    }

    /// Primary files of the given size.
    #[must_use]
    pub fn paths_with_size(&self, size: u64) -> &[PathBuf] {
        self.size_index.get(&size).map_or(&[], Vec::as_slice)
    }

    /// Whether any primary file has this digest.
    #[must_use]
    pub fn contains_digest(&self, digest: &Digest) -> bool {
        self.digests.contains(digest)
    }

    /// Number of unique digests.
    #[must_use]
    pub fn unique_digests(&self) -> usize {
        self.digests.len()
    }

    /// Number of distinct file sizes.
    #[must_use]
    pub fn distinct_sizes(&self) -> usize {
        self.size_index.len()
    }

    /// Number of files in the size index.
    #[must_use]
    pub fn indexed_files(&self) -> usize {
        self.size_index.values().map(Vec::len).sum()
    }
}

/// Statistics from cataloging the primary tree.
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    /// Regular files enumerated with a known size
    pub files_found: usize,
    /// Entries skipped because their size could not be read
    pub unreadable: usize,
    /// Files reached through a followed link that leads out of the tree
    pub outside_root: usize,
    /// Files hashed successfully
    pub files_hashed: usize,
    /// Files that failed to hash
    pub hash_errors: usize,
    /// Unique digests in the catalog
    pub unique_digests: usize,
    /// Per-entry errors encountered
    pub errors: Vec<ScanError>,
    /// Wall time of the phase
    pub duration: Duration,
}

impl CatalogStats {
    /// Total entries examined, readable or not.
    #[must_use]
    pub fn files_examined(&self) -> usize {
        self.files_found + self.unreadable
    }
}

/// Builds a [`Catalog`] for a directory tree.
#[derive(Debug)]
pub struct CatalogBuilder {
    config: ScanConfig,
    hasher: Arc<Hasher>,
    pool: Arc<HashPool>,
}

impl CatalogBuilder {
    /// Create a builder with its own hasher and worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Pool`] if the worker pool cannot be started.
    pub fn new(config: ScanConfig) -> Result<Self, FinderError> {
        let mut hasher = Hasher::new(config.algorithm);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        let pool = HashPool::new(config.workers)?;
        Ok(Self::with_shared(config, Arc::new(hasher), Arc::new(pool)))
    }

    /// Create a builder that reuses an existing hasher and pool.
    #[must_use]
    pub fn with_shared(config: ScanConfig, hasher: Arc<Hasher>, pool: Arc<HashPool>) -> Self {
        Self {
            config,
            hasher,
            pool,
        }
    }

    /// The hasher used for this catalog.
    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Enumerate `root`, hash every file and return the catalog.
    ///
    /// # Errors
    ///
    /// - [`FinderError::RootUnreadable`] if `root` cannot be listed; nothing
    ///   is hashed in that case
    /// - [`FinderError::Interrupted`] if shutdown was requested
    pub fn build(&self, root: &Path) -> Result<(Catalog, CatalogStats), FinderError> {
        let start = Instant::now();
        let mut stats = CatalogStats::default();
        let progress = self.config.progress_callback.as_deref();

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        walker.check_root().map_err(FinderError::RootUnreadable)?;
        let real_root = containment_root(&self.config, root)?;

        log::info!("Cataloging primary tree {}", root.display());

        // Enumerate and index by size
        if let Some(cb) = progress {
            cb.on_phase_start(Phase::CatalogWalk, 0);
        }
        let mut size_index: HashMap<u64, Vec<PathBuf>> = HashMap::new();
        let mut files = Vec::new();
        for result in walker.walk() {
            match result.and_then(|file| contain(real_root.as_deref(), file)) {
                Ok(None) => stats.outside_root += 1,
                Ok(Some(file)) => {
                    stats.files_found += 1;
                    size_index
                        .entry(file.size)
                        .or_default()
                        .push(file.path.clone());
                    files.push(file);
                }
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    stats.unreadable += 1;
                    stats.errors.push(e);
                }
            }
            if let Some(cb) = progress {
                cb.on_progress(
                    Phase::CatalogWalk,
                    ProgressCounters {
                        files_scanned: stats.files_examined(),
                        ..ProgressCounters::default()
                    },
                );
            }
        }
        if let Some(cb) = progress {
            cb.on_phase_end(Phase::CatalogWalk);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files in primary, computing hashes with {} workers",
            stats.files_found,
            self.pool.width()
        );

        // Hash every file
        let total = files.len();
        if let Some(cb) = progress {
            cb.on_phase_start(Phase::CatalogHash, total);
        }
        let hashed = AtomicUsize::new(0);
        let outcomes = self.pool.hash_all(files, &self.hasher, |_| {
            let done = hashed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(cb) = progress {
                cb.on_progress(
                    Phase::CatalogHash,
                    ProgressCounters {
                        files_scanned: total,
                        files_hashed: done,
                        ..ProgressCounters::default()
                    },
                );
            }
        });
        if let Some(cb) = progress {
            cb.on_phase_end(Phase::CatalogHash);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut digests = HashSet::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(digest) => {
                    stats.files_hashed += 1;
                    digests.insert(digest);
                }
                Err(e) => {
                    log::warn!("Could not read {}: {}", outcome.file.path.display(), e);
                    stats.hash_errors += 1;
                    stats.errors.push(ScanError::Hash(e));
                }
            }
        }

        stats.unique_digests = digests.len();
        stats.duration = start.elapsed();

        log::info!(
            "Catalog complete: {} unique hashes from {} files in {:.2?}",
            stats.unique_digests,
            stats.files_examined(),
            stats.duration
        );

        let catalog = Catalog {
            algorithm: self.hasher.algorithm(),
            digests,
            size_index,
        };
        Ok((catalog, stats))
    }
}
