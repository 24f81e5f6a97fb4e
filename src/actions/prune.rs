//! Removal of directories left empty after deletion.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Directories removed by [`prune_empty_dirs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneResult {
    /// Removed directories, deepest first.
    pub removed: Vec<PathBuf>,
}

impl PruneResult {
    /// Number of directories removed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.removed.len()
    }
}

/// Remove every empty directory below `root`, children before parents.
///
/// Because the walk is post-order, removing a child can empty its parent,
/// which is then removed in the same pass. `root` itself is kept. Removal
/// failures (not empty, permission) are skipped silently, and symlinked
/// directories are never entered.
pub fn prune_empty_dirs(root: &Path) -> PruneResult {
    let mut result = PruneResult::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .sort_by_file_name();

    for entry in walker.into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_dir() {
            continue;
        }
        match fs::remove_dir(entry.path()) {
            Ok(()) => {
                log::debug!("Removed empty directory: {}", entry.path().display());
                result.removed.push(entry.into_path());
            }
            Err(e) => log::trace!("Kept directory {}: {}", entry.path().display(), e),
        }
    }

    if !result.removed.is_empty() {
        log::info!("Removed {} empty directories", result.count());
    }
    result
}
