//! On-disk cache record.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scanner::WalkerConfig;

/// Current cache format version.
pub const CACHE_VERSION: u32 = 1;

/// A persisted run result.
///
/// `version`, `created_at` and `scan_options` are optional so that records
/// written without them still load. A record without `scan_options` was
/// produced by a walk that followed no links and excluded nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Format version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// When the record was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Resolved primary root.
    pub primary: PathBuf,
    /// Resolved secondary root.
    pub secondary: PathBuf,
    /// Traversal options of the scan that produced the duplicates.
    #[serde(default)]
    pub scan_options: WalkerConfig,
    /// Duplicate paths in discovery order.
    pub duplicates: Vec<PathBuf>,
}

impl CacheRecord {
    /// Create a record stamped with the current version and time.
    #[must_use]
    pub fn new(primary: PathBuf, secondary: PathBuf, duplicates: Vec<PathBuf>) -> Self {
        Self {
            version: Some(CACHE_VERSION),
            created_at: Some(Utc::now()),
            primary,
            secondary,
            scan_options: WalkerConfig::default(),
            duplicates,
        }
    }

    /// Record the traversal options the duplicates were found with.
    #[must_use]
    pub fn with_scan_options(mut self, options: WalkerConfig) -> Self {
        self.scan_options = options;
        self
    }

    /// Whether this build can read the record's version.
    #[must_use]
    pub fn is_supported_version(&self) -> bool {
        self.version.map_or(true, |v| v == CACHE_VERSION)
    }
}
