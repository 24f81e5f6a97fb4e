//! Progress reporting utilities using indicatif.
//!
//! The engine reports progress through the [`ProgressCallback`] trait. It
//! never waits on the sink and never lets it influence results. Two sinks
//! ship with the crate:
//!
//! - [`Progress`]: terminal progress bars for the CLI
//! - [`NoProgress`]: discards everything (tests, quiet mode)

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Stage of a run being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Enumerating the primary tree
    CatalogWalk,
    /// Hashing primary files
    CatalogHash,
    /// Enumerating the secondary tree
    FinderWalk,
    /// Hashing secondary candidates
    FinderHash,
    /// Deleting duplicates
    Deleting,
    /// Removing empty directories
    Pruning,
}

impl Phase {
    /// Short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CatalogWalk => "Scanning primary",
            Self::CatalogHash => "Hashing primary",
            Self::FinderWalk => "Scanning secondary",
            Self::FinderHash => "Checking candidates",
            Self::Deleting => "Deleting duplicates",
            Self::Pruning => "Removing empty directories",
        }
    }

    const fn is_walk(self) -> bool {
        matches!(self, Self::CatalogWalk | Self::FinderWalk | Self::Pruning)
    }
}

/// Running counters published during a phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounters {
    /// Files enumerated so far
    pub files_scanned: usize,
    /// Files hashed so far
    pub files_hashed: usize,
    /// Duplicates confirmed so far
    pub duplicates_found: usize,
    /// Deletions attempted so far, successful or not
    pub files_deleted: usize,
}

/// Progress callback for the phases of a run.
///
/// Implement this trait to receive progress updates. Calls may arrive from
/// hashing worker threads concurrently.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - The phase being started
    /// * `total` - Number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: Phase, total: usize);

    /// Called as items are processed.
    fn on_progress(&self, phase: Phase, counters: ProgressCounters);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: Phase);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// A progress sink that discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _total: usize) {}
    fn on_progress(&self, _phase: Phase, _counters: ProgressCounters) {}
    fn on_phase_end(&self, _phase: Phase) {}
}

/// Progress reporter using indicatif.
///
/// Shows one bar per phase; walking phases use a spinner because their
/// total is unknown up front.
pub struct Progress {
    multi: MultiProgress,
    current: Mutex<Option<(Phase, ProgressBar)>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirdedupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            current: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(Phase, ProgressBar)>> {
        // A poisoned bar is still usable for display purposes.
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: Phase, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if phase.is_walk() || total == 0 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::walking_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(phase.label());

        if let Some((_, previous)) = self.lock().replace((phase, pb)) {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, phase: Phase, counters: ProgressCounters) {
        if self.quiet {
            return;
        }

        if let Some((current, ref pb)) = *self.lock() {
            if current != phase {
                return;
            }
            if phase.is_walk() {
                pb.set_position(counters.files_scanned as u64);
            } else if phase == Phase::Deleting {
                pb.set_position(counters.files_deleted as u64);
            } else {
                pb.set_position(counters.files_hashed as u64);
                if counters.duplicates_found > 0 {
                    pb.set_message(format!(
                        "{} ({} duplicates)",
                        phase.label(),
                        counters.duplicates_found
                    ));
                }
            }
        }
    }

    fn on_phase_end(&self, phase: Phase) {
        if self.quiet {
            return;
        }

        let mut guard = self.lock();
        if guard.as_ref().is_some_and(|(current, _)| *current == phase) {
            if let Some((_, pb)) = guard.take() {
                pb.finish_with_message(format!("{} complete", phase.label()));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }

        if let Some((_, ref pb)) = *self.lock() {
            pb.set_message(message.to_string());
        } else {
            let _ = self.multi.println(message);
        }
    }
}
