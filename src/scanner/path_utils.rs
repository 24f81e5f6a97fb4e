//! Root validation and path comparison utilities.
//!
//! This module resolves the primary and secondary roots of a run and
//! rejects combinations that would make deletion unsafe. It also provides
//! Unicode-normalized path keys used when comparing stored paths.
//!
//! # Background
//!
//! macOS uses NFD (Decomposed) normalization for file paths, while Windows
//! and Linux typically use NFC (Composed) normalization. The same visual
//! filename can have different byte representations:
//!
//! - NFC: `café` - 'é' is U+00E9 (single code point)
//! - NFD: `café` - 'e' U+0065 + combining acute accent U+0301
//!
//! Paths read back from a cache file are compared through [`path_key`] so
//! that such differences do not invalidate a cache.
//!
//! # Example
//!
//! ```no_run
//! use dirdedupe::scanner::path_utils::resolve_roots;
//! use std::path::Path;
//!
//! let roots = resolve_roots(Path::new("~/Backup1"), Path::new("~/Backup2"))?;
//! println!("{} -> {}", roots.primary.display(), roots.secondary.display());
//! # Ok::<(), dirdedupe::scanner::RootError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;

/// Fatal precondition failures detected before any scanning.
#[derive(thiserror::Error, Debug, Clone)]
pub enum RootError {
    /// The path does not exist.
    #[error("{0} does not exist")]
    NotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("{0} is not a valid directory")]
    NotADirectory(PathBuf),

    /// Both roots resolve to the same directory.
    #[error("primary and secondary cannot be the same directory: {0}")]
    SameDirectory(PathBuf),

    /// The secondary root lies inside the primary root.
    #[error("secondary {secondary} is inside primary {primary}")]
    SecondaryInsidePrimary {
        /// Resolved primary root
        primary: PathBuf,
        /// Resolved secondary root
        secondary: PathBuf,
    },

    /// The primary root lies inside the secondary root.
    #[error("primary {primary} is inside secondary {secondary}")]
    PrimaryInsideSecondary {
        /// Resolved primary root
        primary: PathBuf,
        /// Resolved secondary root
        secondary: PathBuf,
    },

    /// The path could not be resolved.
    #[error("cannot resolve {path}: {source}")]
    Io {
        /// Path that failed to resolve
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// The two validated, canonical roots of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPair {
    /// Authoritative tree; never modified.
    pub primary: PathBuf,
    /// Tree scanned for duplicates and subject to deletion.
    pub secondary: PathBuf,
}

/// Resolve a single root to an absolute, symlink-free directory path.
///
/// # Errors
///
/// Returns [`RootError`] if the path is missing, is not a directory or
/// cannot be canonicalized.
pub fn resolve_root(path: &Path) -> Result<PathBuf, RootError> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RootError::NotFound(path.to_path_buf()),
        _ => RootError::Io {
            path: path.to_path_buf(),
            source: Arc::new(e),
        },
    })?;

    if !metadata.is_dir() {
        return Err(RootError::NotADirectory(path.to_path_buf()));
    }

    std::fs::canonicalize(path).map_err(|e| RootError::Io {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })
}

/// Validate and resolve the primary and secondary roots.
///
/// # Errors
///
/// Returns [`RootError`] if either root is invalid, if both resolve to the
/// same directory, or if one is nested inside the other.
pub fn resolve_roots(primary: &Path, secondary: &Path) -> Result<RootPair, RootError> {
    let primary = resolve_root(primary)?;
    let secondary = resolve_root(secondary)?;

    if primary == secondary {
        return Err(RootError::SameDirectory(primary));
    }
    if secondary.starts_with(&primary) {
        return Err(RootError::SecondaryInsidePrimary { primary, secondary });
    }
    if primary.starts_with(&secondary) {
        return Err(RootError::PrimaryInsideSecondary { primary, secondary });
    }

    log::debug!(
        "Resolved roots: primary={}, secondary={}",
        primary.display(),
        secondary.display()
    );
    Ok(RootPair { primary, secondary })
}

/// Whether `path`, with every symlink resolved, lies strictly inside
/// `real_root`.
///
/// `real_root` must already be canonical.
///
/// # Errors
///
/// Returns the I/O error if `path` cannot be resolved.
pub fn resolves_within(path: &Path, real_root: &Path) -> std::io::Result<bool> {
    let real = std::fs::canonicalize(path)?;
    Ok(real != real_root && real.starts_with(real_root))
}

/// Normalize a path string to NFC (Composed) form.
///
/// # Example
///
/// ```
/// use dirdedupe::scanner::path_utils::normalize_path_str;
///
/// let nfd = "cafe\u{0301}.txt"; // NFD form
/// assert_eq!(normalize_path_str(nfd), "café.txt");
/// ```
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// A normalized string key for comparing paths.
///
/// Uses NFC normalization; invalid UTF-8 is replaced lossily.
#[must_use]
pub fn path_key(path: &Path) -> String {
    normalize_path_str(&path.to_string_lossy())
}

/// Compare two paths after Unicode normalization.
#[must_use]
pub fn paths_equal_normalized(a: &Path, b: &Path) -> bool {
    path_key(a) == path_key(b)
}
