//! Loading and saving the result cache.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::record::CacheRecord;
use super::{CacheError, CacheResult};
use crate::scanner::{paths_equal_normalized, RootPair, WalkerConfig};

/// Why a cached record was not reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMiss {
    /// No cache file exists.
    Absent,
    /// The cache file exists but could not be read.
    Unreadable(String),
    /// The cache file is not a valid record.
    Malformed(String),
    /// The record was written by an incompatible version.
    UnsupportedVersion(u32),
    /// The record was made for a different primary tree.
    PrimaryMismatch,
    /// The record was made for a different secondary tree.
    SecondaryMismatch,
    /// The record was made with different traversal options.
    OptionsMismatch,
    /// This many listed duplicates no longer exist.
    MissingFiles(usize),
}

impl fmt::Display for CacheMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "no cache file"),
            Self::Unreadable(e) => write!(f, "cache file unreadable: {}", e),
            Self::Malformed(e) => write!(f, "cache file malformed: {}", e),
            Self::UnsupportedVersion(v) => write!(f, "unsupported cache version {}", v),
            Self::PrimaryMismatch => write!(f, "primary directory differs"),
            Self::SecondaryMismatch => write!(f, "secondary directory differs"),
            Self::OptionsMismatch => write!(f, "scan options differ"),
            Self::MissingFiles(n) => write!(f, "{} cached duplicate(s) no longer exist", n),
        }
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The record is valid for this pair of trees.
    Hit(Vec<PathBuf>),
    /// The record must be ignored and a full scan run.
    Miss(CacheMiss),
}

impl CacheLookup {
    /// The cached duplicates, if the lookup hit.
    #[must_use]
    pub fn hit(self) -> Option<Vec<PathBuf>> {
        match self {
            Self::Hit(paths) => Some(paths),
            Self::Miss(_) => None,
        }
    }
}

/// A result cache stored as a JSON file.
///
/// Records are keyed on the two roots and on the traversal options, since
/// the options decide which files a scan may report.
#[derive(Debug, Clone)]
pub struct ResultCache {
    path: PathBuf,
    scan_options: WalkerConfig,
}

impl ResultCache {
    /// Use the cache file at `path` for scans with default traversal options.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scan_options: WalkerConfig::default(),
        }
    }

    /// Key saved and loaded records on `options`.
    #[must_use]
    pub fn with_scan_options(mut self, options: WalkerConfig) -> Self {
        self.scan_options = options;
        self
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the duplicate list for `roots`, replacing any existing record.
    ///
    /// The record is written to a sibling temporary file and renamed over
    /// the target, so a crash never leaves a half-written cache behind.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the record cannot be serialized or written.
    pub fn save(&self, roots: &RootPair, duplicates: &[PathBuf]) -> CacheResult<()> {
        let record = CacheRecord::new(
            roots.primary.clone(),
            roots.secondary.clone(),
            duplicates.to_vec(),
        )
        .with_scan_options(self.scan_options.clone());
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| CacheError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let tmp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::io(&tmp, e));
        }
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            CacheError::io(&self.path, e)
        })?;

        log::debug!(
            "Saved {} duplicates to cache {}",
            duplicates.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the duplicate list for `roots` if the record is fully valid.
    ///
    /// Never fails: every problem is reported as a [`CacheMiss`].
    #[must_use]
    pub fn load(&self, roots: &RootPair) -> CacheLookup {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return CacheLookup::Miss(CacheMiss::Absent)
            }
            Err(e) => return CacheLookup::Miss(CacheMiss::Unreadable(e.to_string())),
        };

        let record: CacheRecord = match serde_json::from_str(&content) {
            Ok(r) => r,
            Err(e) => return CacheLookup::Miss(CacheMiss::Malformed(e.to_string())),
        };

        validate(record, roots, &self.scan_options)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

fn validate(record: CacheRecord, roots: &RootPair, scan_options: &WalkerConfig) -> CacheLookup {
    if !record.is_supported_version() {
        return CacheLookup::Miss(CacheMiss::UnsupportedVersion(
            record.version.unwrap_or_default(),
        ));
    }
    if !paths_equal_normalized(&record.primary, &roots.primary) {
        return CacheLookup::Miss(CacheMiss::PrimaryMismatch);
    }
    if !paths_equal_normalized(&record.secondary, &roots.secondary) {
        return CacheLookup::Miss(CacheMiss::SecondaryMismatch);
    }
    if record.scan_options != *scan_options {
        return CacheLookup::Miss(CacheMiss::OptionsMismatch);
    }

    let missing = record
        .duplicates
        .iter()
        .filter(|p| fs::symlink_metadata(p).is_err())
        .count();
    if missing > 0 {
        return CacheLookup::Miss(CacheMiss::MissingFiles(missing));
    }

    CacheLookup::Hit(record.duplicates)
}
