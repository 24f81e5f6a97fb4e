//! Duplicate finder for the secondary tree.
//!
//! # Overview
//!
//! Given a [`Catalog`] of the primary tree, the finder:
//! 1. **Walks** the secondary tree sequentially
//! 2. **Size pre-filter**: drops every file whose size has no entry in the
//!    primary size index, without hashing it
//! 3. **Hashes** the surviving candidates on the worker pool
//! 4. **Classifies** a candidate as a duplicate iff its digest is in the
//!    primary digest set
//!
//! Size is only ever a pre-filter. Two files of equal size and different
//! content never match because classification is by digest alone.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::catalog::{Catalog, CatalogBuilder, CatalogStats};
use super::pool::HashPool;
use super::{contain, containment_root, DuplicateList, FinderError, ScanConfig};
use crate::progress::{Phase, ProgressCounters};
use crate::scanner::{Hasher, RootPair, ScanError, Walker};

/// Statistics from scanning the secondary tree.
#[derive(Debug, Clone, Default)]
pub struct FinderStats {
    /// Regular files enumerated with a known size
    pub files_scanned: usize,
    /// Entries skipped because their size could not be read
    pub unreadable: usize,
    /// Files reached through a followed link that leads out of the tree
    pub outside_root: usize,
    /// Files skipped because no primary file has their size
    pub skipped_by_size: usize,
    /// Files that passed the size pre-filter
    pub candidates: usize,
    /// Candidates hashed successfully
    pub files_hashed: usize,
    /// Candidates that failed to hash
    pub hash_errors: usize,
    /// Duplicates confirmed
    pub duplicates_found: usize,
    /// Per-entry errors encountered
    pub errors: Vec<ScanError>,
    /// Wall time of the phase
    pub duration: Duration,
}

impl FinderStats {
    /// Percentage of scanned files eliminated by the size pre-filter.
    #[must_use]
    pub fn prefilter_rate(&self) -> f64 {
        if self.files_scanned == 0 {
            0.0
        } else {
            (self.skipped_by_size as f64 / self.files_scanned as f64) * 100.0
        }
    }
}

/// Full result of scanning a pair of trees.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Confirmed duplicates in the secondary tree
    pub duplicates: DuplicateList,
    /// Primary-side statistics
    pub catalog_stats: CatalogStats,
    /// Secondary-side statistics
    pub finder_stats: FinderStats,
}

/// Duplicate finder that runs the catalog and classification phases.
///
/// One hasher and one worker pool serve both phases.
///
/// # Example
///
/// ```no_run
/// use dirdedupe::duplicates::{DuplicateFinder, ScanConfig};
/// use dirdedupe::scanner::resolve_roots;
/// use std::path::Path;
///
/// let roots = resolve_roots(Path::new("/a"), Path::new("/b"))?;
/// let finder = DuplicateFinder::new(ScanConfig::default())?;
/// let outcome = finder.scan(&roots)?;
/// println!("{} duplicates", outcome.duplicates.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: ScanConfig,
    hasher: Arc<Hasher>,
    pool: Arc<HashPool>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
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
        Ok(Self {
            config,
            hasher: Arc::new(hasher),
            pool: Arc::new(pool),
        })
    }

    /// Create a new duplicate finder with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Pool`] if the worker pool cannot be started.
    pub fn with_defaults() -> Result<Self, FinderError> {
        Self::new(ScanConfig::default())
    }

    /// The shared hasher; its call counter covers both phases.
    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// A catalog builder sharing this finder's hasher and pool.
    #[must_use]
    pub fn catalog_builder(&self) -> CatalogBuilder {
        CatalogBuilder::with_shared(
            self.config.clone(),
            Arc::clone(&self.hasher),
            Arc::clone(&self.pool),
        )
    }

    /// Catalog the primary tree, then find its duplicates in the secondary.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if a root cannot be listed or the scan is
    /// interrupted.
    pub fn scan(&self, roots: &RootPair) -> Result<ScanOutcome, FinderError> {
        let (catalog, catalog_stats) = self.catalog_builder().build(&roots.primary)?;
        let (duplicates, finder_stats) = self.find_duplicates(&roots.secondary, &catalog)?;
        Ok(ScanOutcome {
            duplicates,
            catalog_stats,
            finder_stats,
        })
    }

    /// Find files under `root` whose content is in `catalog`.
    ///
    /// Duplicates are returned in enumeration order.
    ///
    /// # Errors
    ///
    /// - [`FinderError::RootUnreadable`] if `root` cannot be listed
    /// - [`FinderError::Interrupted`] if shutdown was requested
    pub fn find_duplicates(
        &self,
        root: &Path,
        catalog: &Catalog,
    ) -> Result<(DuplicateList, FinderStats), FinderError> {
        let start = Instant::now();
        let mut stats = FinderStats::default();
        let progress = self.config.progress_callback.as_deref();

        if catalog.algorithm() != self.hasher.algorithm() {
            log::warn!(
                "Catalog uses {} but finder hashes with {}; nothing can match",
                catalog.algorithm(),
                self.hasher.algorithm()
            );
        }

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        walker.check_root().map_err(FinderError::RootUnreadable)?;
        let real_root = containment_root(&self.config, root)?;

        log::info!("Comparing against {}", root.display());

        // Enumerate and pre-filter by size
        if let Some(cb) = progress {
            cb.on_phase_start(Phase::FinderWalk, 0);
        }
        let mut candidates = Vec::new();
        for result in walker.walk() {
            match result.and_then(|file| contain(real_root.as_deref(), file)) {
                Ok(None) => stats.outside_root += 1,
                Ok(Some(file)) => {
                    stats.files_scanned += 1;
                    if catalog.has_size(file.size) {
                        candidates.push(file);
                    } else {
                        stats.skipped_by_size += 1;
                    }
                }
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    stats.unreadable += 1;
                    stats.errors.push(e);
                }
            }
            if let Some(cb) = progress {
                cb.on_progress(
                    Phase::FinderWalk,
                    ProgressCounters {
                        files_scanned: stats.files_scanned + stats.unreadable,
                        ..ProgressCounters::default()
                    },
                );
            }
        }
        if let Some(cb) = progress {
            cb.on_phase_end(Phase::FinderWalk);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        stats.candidates = candidates.len();
        log::info!(
            "Scanned {} files, skipped {} (no size match in primary), checking {} with {} workers",
            stats.files_scanned,
            stats.skipped_by_size,
            stats.candidates,
            self.pool.width()
        );

        // Hash candidates and test membership
        if let Some(cb) = progress {
            cb.on_phase_start(Phase::FinderHash, stats.candidates);
        }
        let checked = AtomicUsize::new(0);
        let found = AtomicUsize::new(0);
        let scanned = stats.files_scanned;
        let outcomes = self.pool.hash_all(candidates, &self.hasher, |outcome| {
            let done = checked.fetch_add(1, Ordering::Relaxed) + 1;
            let dupes = match outcome.result {
                Ok(ref digest) if catalog.contains_digest(digest) => {
                    found.fetch_add(1, Ordering::Relaxed) + 1
                }
                _ => found.load(Ordering::Relaxed),
            };
            if let Some(cb) = progress {
                cb.on_progress(
                    Phase::FinderHash,
                    ProgressCounters {
                        files_scanned: scanned,
                        files_hashed: done,
                        duplicates_found: dupes,
                        ..ProgressCounters::default()
                    },
                );
            }
        });
        if let Some(cb) = progress {
            cb.on_phase_end(Phase::FinderHash);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut duplicates = DuplicateList::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(digest) => {
                    stats.files_hashed += 1;
                    if catalog.contains_digest(&digest) {
                        log::debug!("Duplicate: {}", outcome.file.path.display());
                        duplicates.push(outcome.file.path);
                    }
                }
                Err(e) => {
                    log::warn!("Could not read {}: {}", outcome.file.path.display(), e);
                    stats.hash_errors += 1;
                    stats.errors.push(ScanError::Hash(e));
                }
            }
        }

        stats.duplicates_found = duplicates.len();
        stats.duration = start.elapsed();

        log::info!(
            "Completed: checked {} files, found {} duplicates in {:.2?}",
            stats.files_hashed + stats.hash_errors,
            stats.duplicates_found,
            stats.duration
        );

        Ok((duplicates, stats))
    }
}
