//! Run orchestration.
//!
//! A run moves through these phases:
//!
//! ```text
//! Idle -> (CacheHit | Scanning) -> DuplicatesKnown
//!      -> Reporting -> Done
//!      -> AwaitingConfirmation -> (Done | Deleting -> PruningDirs -> Done)
//! ```
//!
//! `AwaitingConfirmation` is entered whenever deletion was requested and
//! there is something to delete, whether the duplicates came from a scan or
//! from the cache. Declining ends the run without touching the filesystem.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::actions::{
    delete_batch, prune_empty_dirs, BatchDeleteResult, DeleteConfig, DeleteError, DeleteMode,
    DeleteProgressCallback, PruneResult,
};
use crate::cache::{CacheLookup, CacheMiss, ResultCache};
use crate::duplicates::{
    default_workers, CatalogStats, DuplicateFinder, DuplicateList, FinderError, FinderStats,
    ScanConfig,
};
use crate::progress::{NoProgress, Phase, ProgressCallback, ProgressCounters};
use crate::prompt::Confirm;
use crate::scanner::{resolve_roots, HashAlgorithm, RootError, RootPair, WalkerConfig};

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    CacheHit,
    Scanning,
    DuplicatesKnown,
    Reporting,
    AwaitingConfirmation,
    Deleting,
    PruningDirs,
    Done,
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory whose files are kept.
    pub primary: PathBuf,
    /// Directory searched for duplicates.
    pub secondary: PathBuf,
    /// Delete duplicates after confirmation.
    pub delete: bool,
    /// How duplicates are removed.
    pub delete_mode: DeleteMode,
    /// Result cache location, if caching is wanted.
    pub cache: Option<PathBuf>,
    /// Number of hashing workers.
    pub workers: usize,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Traversal options.
    pub walker_config: WalkerConfig,
}

impl RunOptions {
    /// Report-only options for a pair of directories.
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
            delete: false,
            delete_mode: DeleteMode::default(),
            cache: None,
            workers: default_workers(),
            algorithm: HashAlgorithm::default(),
            walker_config: WalkerConfig::default(),
        }
    }

    /// Request deletion.
    #[must_use]
    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    /// Use a result cache at `path`.
    #[must_use]
    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache = Some(path.into());
        self
    }

    /// Set the number of hashing workers (minimum 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Final phase, always [`RunPhase::Done`] for a returned report.
    pub phase: RunPhase,
    /// Every phase entered, in order.
    pub transitions: Vec<RunPhase>,
    /// Resolved roots.
    pub roots: RootPair,
    /// Confirmed duplicates.
    pub duplicates: DuplicateList,
    /// Whether the duplicates came from the cache.
    pub from_cache: bool,
    /// Why the cache was not used, when a cache was configured.
    pub cache_miss: Option<CacheMiss>,
    /// Primary-side statistics (absent on a cache hit).
    pub catalog_stats: Option<CatalogStats>,
    /// Secondary-side statistics (absent on a cache hit).
    pub finder_stats: Option<FinderStats>,
    /// Combined size of the duplicates at report time.
    pub reclaimable_bytes: u64,
    /// Whether deletion was requested.
    pub delete_requested: bool,
    /// The answer to the confirmation prompt, if one was asked.
    pub confirmed: Option<bool>,
    /// Removal method used.
    pub delete_mode: DeleteMode,
    /// Deletion outcome, if deletion ran.
    pub deleted: Option<BatchDeleteResult>,
    /// Pruning outcome, if pruning ran.
    pub pruned: Option<PruneResult>,
}

impl RunReport {
    /// Number of files actually deleted.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.as_ref().map_or(0, BatchDeleteResult::success_count)
    }

    /// Bytes actually freed.
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.deleted.as_ref().map_or(0, |d| d.bytes_freed)
    }

    /// Whether the deletion batch was cut short.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.deleted
            .as_ref()
            .is_some_and(BatchDeleteResult::was_interrupted)
    }

    /// Whether any per-file problem was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        let scan = self
            .catalog_stats
            .as_ref()
            .is_some_and(|s| !s.errors.is_empty())
            || self
                .finder_stats
                .as_ref()
                .is_some_and(|s| !s.errors.is_empty());
        let delete = self.deleted.as_ref().is_some_and(|d| !d.failures.is_empty());
        scan || delete
    }
}

/// Errors that abort a run.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The directories cannot be used as a pair.
    #[error(transparent)]
    Root(#[from] RootError),

    /// Scanning failed before producing a result.
    #[error(transparent)]
    Finder(FinderError),

    /// The run was interrupted before the duplicates were known.
    #[error("Scan interrupted by user")]
    Interrupted,
}

impl From<FinderError> for EngineError {
    fn from(err: FinderError) -> Self {
        match err {
            FinderError::Interrupted => Self::Interrupted,
            other => Self::Finder(other),
        }
    }
}

/// Forwards deletion progress to a [`ProgressCallback`].
struct DeletionProgress<'a> {
    progress: &'a dyn ProgressCallback,
    done: AtomicUsize,
}

impl DeletionProgress<'_> {
    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        self.progress.on_progress(
            Phase::Deleting,
            ProgressCounters {
                files_deleted: done,
                ..ProgressCounters::default()
            },
        );
    }
}

impl DeleteProgressCallback for DeletionProgress<'_> {
    fn on_before_delete(&self, _path: &std::path::Path, _index: usize, _total: usize) {}

    fn on_delete_success(&self, _path: &std::path::Path, _size: u64) {
        self.tick();
    }

    fn on_delete_failure(&self, _path: &std::path::Path, _error: &DeleteError) {
        self.tick();
    }

    fn on_complete(&self, _result: &BatchDeleteResult) {}
}

/// Drives a run from root validation to cleanup.
pub struct Engine {
    options: RunOptions,
    progress: Arc<dyn ProgressCallback>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("shutdown_flag", &self.shutdown_flag)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine for `options` with no progress output.
    #[must_use]
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            progress: Arc::new(NoProgress),
            shutdown_flag: None,
        }
    }

    /// Report progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Observe `flag` for graceful shutdown.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The options this engine runs with.
    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::default()
            .with_workers(self.options.workers)
            .with_algorithm(self.options.algorithm)
            .with_walker_config(self.options.walker_config.clone())
            .with_progress_callback(Arc::clone(&self.progress));
        if let Some(ref flag) = self.shutdown_flag {
            config = config.with_shutdown_flag(Arc::clone(flag));
        }
        config
    }

    /// Execute the run.
    ///
    /// `confirm` is consulted exactly once when deletion was requested and
    /// duplicates exist, and never otherwise.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Root`] if the directories are invalid or nested
    /// - [`EngineError::Finder`] if a root cannot be listed
    /// - [`EngineError::Interrupted`] if shutdown was requested while
    ///   scanning (the cache is not written)
    pub fn run(&self, confirm: &dyn Confirm) -> Result<RunReport, EngineError> {
        let opts = &self.options;
        let mut transitions = vec![RunPhase::Idle];

        let roots = resolve_roots(&opts.primary, &opts.secondary)?;
        log::info!(
            "Primary: {}, secondary: {}",
            roots.primary.display(),
            roots.secondary.display()
        );

        let cache = opts
            .cache
            .as_ref()
            .map(|path| ResultCache::new(path).with_scan_options(opts.walker_config.clone()));
        let mut cache_miss = None;
        let mut cached = None;
        if let Some(ref cache) = cache {
            match cache.load(&roots) {
                CacheLookup::Hit(paths) => {
                    log::info!(
                        "Loaded {} duplicates from cache {}",
                        paths.len(),
                        cache.path().display()
                    );
                    cached = Some(paths);
                }
                CacheLookup::Miss(reason) => {
                    log::info!("Not using cache {}: {}", cache.path().display(), reason);
                    cache_miss = Some(reason);
                }
            }
        }

        let from_cache = cached.is_some();
        let (duplicates, catalog_stats, finder_stats) = match cached {
            Some(paths) => {
                transitions.push(RunPhase::CacheHit);
                (paths, None, None)
            }
            None => {
                transitions.push(RunPhase::Scanning);
                let finder = DuplicateFinder::new(self.scan_config())?;
                let outcome = finder.scan(&roots)?;
                if let Some(ref cache) = cache {
                    if let Err(e) = cache.save(&roots, &outcome.duplicates) {
                        log::warn!("{}", e);
                    }
                }
                (
                    outcome.duplicates,
                    Some(outcome.catalog_stats),
                    Some(outcome.finder_stats),
                )
            }
        };
        transitions.push(RunPhase::DuplicatesKnown);

        let reclaimable_bytes = duplicates
            .iter()
            .filter_map(|p| fs::symlink_metadata(p).ok())
            .map(|m| m.len())
            .sum();

        let mut report = RunReport {
            phase: RunPhase::DuplicatesKnown,
            transitions,
            roots,
            duplicates,
            from_cache,
            cache_miss,
            catalog_stats,
            finder_stats,
            reclaimable_bytes,
            delete_requested: opts.delete,
            confirmed: None,
            delete_mode: opts.delete_mode,
            deleted: None,
            pruned: None,
        };

        if !opts.delete || report.duplicates.is_empty() {
            report.transitions.push(RunPhase::Reporting);
            return Ok(finish(report));
        }

        report.transitions.push(RunPhase::AwaitingConfirmation);
        let question = format!(
            "Delete {} duplicate file(s) ({}) from {}{}?",
            report.duplicates.len(),
            bytesize::ByteSize::b(report.reclaimable_bytes),
            report.roots.secondary.display(),
            if opts.delete_mode.is_permanent() {
                " permanently"
            } else {
                " to the trash"
            }
        );
        let confirmed = confirm.confirm(&question);
        report.confirmed = Some(confirmed);
        if !confirmed {
            log::info!("Deletion cancelled");
            return Ok(finish(report));
        }

        report.transitions.push(RunPhase::Deleting);
        self.progress
            .on_phase_start(Phase::Deleting, report.duplicates.len());
        let config = DeleteConfig::default()
            .with_mode(opts.delete_mode)
            .with_root(&report.roots.secondary);
        let sink = DeletionProgress {
            progress: self.progress.as_ref(),
            done: AtomicUsize::new(0),
        };
        let deleted = delete_batch(
            &report.duplicates,
            &config,
            Some(&sink),
            self.shutdown_flag.as_deref(),
        );
        self.progress.on_phase_end(Phase::Deleting);
        log::info!("{}", deleted.summary());
        let interrupted = deleted.was_interrupted();
        report.deleted = Some(deleted);

        if interrupted {
            return Ok(finish(report));
        }

        report.transitions.push(RunPhase::PruningDirs);
        self.progress.on_phase_start(Phase::Pruning, 0);
        report.pruned = Some(prune_empty_dirs(&report.roots.secondary));
        self.progress.on_phase_end(Phase::Pruning);

        Ok(finish(report))
    }
}

fn finish(mut report: RunReport) -> RunReport {
    report.transitions.push(RunPhase::Done);
    report.phase = RunPhase::Done;
    report
}
