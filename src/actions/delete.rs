//! Duplicate removal.
//!
//! # Overview
//!
//! - Permanent deletion (default)
//! - Move to system trash via the `trash` crate
//! - Sequential batch with per-file failures absorbed
//! - Size captured before removal, so freed bytes reflect what was removed
//!
//! # Safety
//!
//! When a root is configured, any path outside it is refused without being
//! touched, including paths that only reach outside through a symlinked
//! directory. Deletion itself is irreversible in permanent mode; callers must
//! obtain confirmation first.
//!
//! # Example
//!
//! ```no_run
//! use dirdedupe::actions::delete::{delete_batch, DeleteConfig, NoDeleteCallback};
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/backup/dup.txt")];
//! let config = DeleteConfig::default().with_root("/backup");
//! let result = delete_batch::<NoDeleteCallback>(&paths, &config, None, None);
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Path is not a regular file or symlink.
    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    /// Path lies outside the directory deletion is confined to.
    #[error("refusing to delete {path}: outside {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotAFile(p)
            | Self::OutsideRoot { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// How duplicates are removed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Remove the file outright.
    #[default]
    Permanent,
    /// Move the file to the platform trash.
    Trash,
}

impl DeleteMode {
    /// Whether removal can not be undone.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Permanent)
    }
}

impl std::fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the file just before it was deleted.
    pub size: u64,
    /// How it was removed.
    pub mode: DeleteMode,
}

/// Results of a batch deletion.
#[derive(Debug, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions.
    pub failures: Vec<DeleteError>,
    /// Files not attempted because the batch was interrupted.
    pub skipped: usize,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether the batch stopped early.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.skipped > 0
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = bytesize::ByteSize::b(self.bytes_freed);
        let mut text = format!("Deleted {} file(s), freed {}", self.success_count(), freed);
        if !self.failures.is_empty() {
            text.push_str(&format!(", {} failed", self.failure_count()));
        }
        if self.skipped > 0 {
            text.push_str(&format!(", {} skipped", self.skipped));
        }
        text
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Removal method.
    pub mode: DeleteMode,
    /// Directory every deleted path must be inside, if set.
    pub root: Option<PathBuf>,
}

impl DeleteConfig {
    /// Config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self {
            mode: DeleteMode::Trash,
            root: None,
        }
    }

    /// Set the removal method.
    #[must_use]
    pub fn with_mode(mut self, mode: DeleteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Confine deletion to paths under `root`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn check_confined(&self, path: &Path) -> Result<(), DeleteError> {
        let Some(ref root) = self.root else {
            return Ok(());
        };
        let outside = || DeleteError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.clone(),
        };
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || path == root || !path.starts_with(root) {
            return Err(outside());
        }

        // A symlinked directory on the way can still lead out of the root.
        // The final component is left alone: a link is removed, not its target.
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(outside());
        };
        let real_root = fs::canonicalize(root).map_err(|e| DeleteError::from_io(path, e))?;
        let real_parent = fs::canonicalize(parent).map_err(|e| DeleteError::from_io(path, e))?;
        let real = real_parent.join(name);
        if real == real_root || !real.starts_with(&real_root) {
            return Err(outside());
        }
        Ok(())
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &DeleteError);

    /// Called when the batch completes.
    fn on_complete(&self, result: &BatchDeleteResult);
}

/// A deletion callback that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeleteCallback;

impl DeleteProgressCallback for NoDeleteCallback {
    fn on_before_delete(&self, _: &Path, _: usize, _: usize) {}
    fn on_delete_success(&self, _: &Path, _: u64) {}
    fn on_delete_failure(&self, _: &Path, _: &DeleteError) {}
    fn on_complete(&self, _: &BatchDeleteResult) {}
}

/// Size of the entry at `path` without following symlinks.
fn size_before_delete(path: &Path) -> Result<u64, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if metadata.is_dir() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }
    Ok(metadata.len())
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata can't be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = size_before_delete(path)?;

    trash::delete(path).map_err(|e| DeleteError::TrashFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        mode: DeleteMode::Trash,
    })
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `Io` for any other failure
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = size_before_delete(path)?;

    fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        mode: DeleteMode::Permanent,
    })
}

/// Delete one file according to `config`.
///
/// # Errors
///
/// Returns [`DeleteError::OutsideRoot`] for a path outside the configured
/// root, otherwise whatever the chosen removal method reports.
pub fn delete_file(path: &Path, config: &DeleteConfig) -> Result<DeleteResult, DeleteError> {
    config.check_confined(path)?;
    match config.mode {
        DeleteMode::Permanent => permanent_delete(path),
        DeleteMode::Trash => delete_to_trash(path),
    }
}

/// Delete files one after another.
///
/// Per-file failures are logged and recorded; the batch always continues.
/// If `shutdown` becomes set, the remaining files are left alone and
/// counted as skipped.
pub fn delete_batch<C: DeleteProgressCallback>(
    paths: &[PathBuf],
    config: &DeleteConfig,
    callback: Option<&C>,
    shutdown: Option<&AtomicBool>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();
    let total = paths.len();

    for (index, path) in paths.iter().enumerate() {
        if shutdown.is_some_and(|f| f.load(Ordering::SeqCst)) {
            result.skipped = total - index;
            log::warn!("Deletion interrupted, {} file(s) left untouched", result.skipped);
            break;
        }

        if let Some(cb) = callback {
            cb.on_before_delete(path, index, total);
        }

        match delete_file(path, config) {
            Ok(del) => {
                result.bytes_freed += del.size;
                if let Some(cb) = callback {
                    cb.on_delete_success(path, del.size);
                }
                result.successes.push(del);
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                if let Some(cb) = callback {
                    cb.on_delete_failure(path, &e);
                }
                result.failures.push(e);
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&result);
    }

    result
}
