//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and collecting the regular files it contains. Traversal is
//! sequential: the expensive part of a scan is hashing, which runs on a
//! separate worker pool.
//!
//! # Traversal policy
//!
//! - Symbolic links are skipped unless `follow_symlinks` is set; loops are
//!   then reported as [`ScanError::SymlinkLoop`].
//! - Special files (FIFOs, sockets, devices) are skipped.
//! - Hard links are ordinary files; every link name is reported.
//! - Zero-byte files are reported.
//! - Entries are visited in file-name order within each directory.
//! - Excluded directories are not descended into.
//!
//! # Example
//!
//! ```no_run
//! use dirdedupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::new(false, vec!["*.tmp".to_string()]);
//! let walker = Walker::new(Path::new("/home/user/Backup"), config);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{FileRecord, ScanError, WalkerConfig};

/// Directory walker for sequential file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The root this walker enumerates.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the exclusion matcher from configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check the root can be listed at all.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root directory cannot be read.
    pub fn check_root(&self) -> Result<(), ScanError> {
        std::fs::read_dir(&self.root)
            .map(|_| ())
            .map_err(|e| ScanError::from_io(self.root.clone(), e))
    }

    /// Walk the directory tree, yielding regular files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let root = self.root.clone();

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !is_ignored(
                        &root,
                        gitignore.as_ref(),
                        entry.path(),
                        entry.file_type().is_dir(),
                    )
            })
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return false;
                }
                true
            })
            .filter_map(move |entry| self.process_entry(entry))
    }

    fn process_entry(
        &self,
        entry: walkdir::Result<DirEntry>,
    ) -> Option<Result<FileRecord, ScanError>> {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return Some(Err(self.convert_error(e))),
        };

        if entry.depth() == 0 {
            return None;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }
        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }
        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", entry.path().display());
            return None;
        }

        match entry.metadata() {
            Ok(metadata) => Some(Ok(FileRecord::new(entry.into_path(), metadata.len()))),
            Err(e) => Some(Err(self.convert_error(e))),
        }
    }

    fn convert_error(&self, err: walkdir::Error) -> ScanError {
        let path = err
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if err.loop_ancestor().is_some() {
            return ScanError::SymlinkLoop(path);
        }

        match err.into_io_error() {
            Some(io) => ScanError::from_io(path, io),
            None => ScanError::from_io(path, std::io::Error::other("directory walk failed")),
        }
    }
}

fn is_ignored(root: &Path, gitignore: Option<&Gitignore>, path: &Path, is_dir: bool) -> bool {
    let Some(gi) = gitignore else {
        return false;
    };
    let relative = path.strip_prefix(root).unwrap_or(path);
    let matched = gi.matched(relative, is_dir).is_ignore();
    if matched {
        log::trace!("Ignoring: {}", path.display());
    }
    matched
}
