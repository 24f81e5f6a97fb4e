//! Bounded hashing worker pool.
//!
//! Hashing tasks run on a dedicated rayon pool whose width is fixed when the
//! pool is built, so open file descriptors and buffers scale with the width
//! rather than with the number of files. Workers share nothing mutable: each
//! task returns its [`HashOutcome`] and rayon's `collect` is the single
//! collecting point.

use rayon::prelude::*;

use crate::scanner::{Digest, FileRecord, HashError, Hasher};

/// Default number of hashing workers: half the logical CPUs, at least one.
///
/// # Example
///
/// ```
/// assert!(dirdedupe::duplicates::default_workers() >= 1);
/// ```
#[must_use]
pub fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    (cpus / 2).max(1)
}

/// Result of hashing one file.
#[derive(Debug, Clone)]
pub struct HashOutcome {
    /// The file that was hashed
    pub file: FileRecord,
    /// Its digest, or the reason it could not be read
    pub result: Result<Digest, HashError>,
}

/// A fixed-width pool of hashing workers.
pub struct HashPool {
    pool: rayon::ThreadPool,
    width: usize,
}

impl std::fmt::Debug for HashPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashPool")
            .field("width", &self.width)
            .finish()
    }
}

impl HashPool {
    /// Build a pool with `width` worker threads (minimum 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to spawn the threads.
    pub fn new(width: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let width = width.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("dirdedupe-hash-{}", i))
            .build()?;
        log::debug!("Built hashing pool with {} workers", width);
        Ok(Self { pool, width })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Hash every file on the pool and return one outcome per input file.
    ///
    /// Outcomes come back in input order. `on_done` is invoked from worker
    /// threads as each file finishes; it must not block.
    pub fn hash_all<F>(&self, files: Vec<FileRecord>, hasher: &Hasher, on_done: F) -> Vec<HashOutcome>
    where
        F: Fn(&HashOutcome) + Sync,
    {
        if files.is_empty() {
            return Vec::new();
        }

        self.pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    let result = hasher.hash_file(&file.path);
                    let outcome = HashOutcome { file, result };
                    on_done(&outcome);
                    outcome
                })
                .collect()
        })
    }
}
