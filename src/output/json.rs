//! JSON rendering of a run for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "primary": "/archive",
//!   "secondary": "/backup",
//!   "from_cache": false,
//!   "duplicates": ["/backup/old/copy.txt"],
//!   "summary": {
//!     "primary_files": 120,
//!     "secondary_files": 80,
//!     "skipped_by_size": 31,
//!     "duplicates_found": 1,
//!     "reclaimable_bytes": 5,
//!     "unreadable": 0,
//!     "scan_duration_ms": 42
//!   },
//!   "deletion": {
//!     "confirmed": true,
//!     "mode": "permanent",
//!     "deleted": 1,
//!     "failed": [],
//!     "skipped": 0,
//!     "bytes_freed": 5,
//!     "directories_removed": 1
//!   },
//!   "phase": "done",
//!   "exit_code": 0,
//!   "exit_code_name": "DD000"
//! }
//! ```
//!
//! `deletion` is `null` when no deletion was requested.

use std::io::Write;

use serde::Serialize;

use crate::actions::DeleteMode;
use crate::engine::{RunPhase, RunReport};
use crate::error::ExitCode;

/// Counts for the scan, absent fields on a cache hit.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub primary_files: Option<usize>,
    pub secondary_files: Option<usize>,
    pub skipped_by_size: Option<usize>,
    pub duplicates_found: usize,
    pub reclaimable_bytes: u64,
    pub unreadable: usize,
    pub scan_duration_ms: Option<u64>,
}

/// A file that could not be deleted.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    pub path: String,
    pub error: String,
}

/// Deletion outcome.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeletion {
    /// Answer at the prompt; `null` if never asked.
    pub confirmed: Option<bool>,
    pub mode: DeleteMode,
    pub deleted: usize,
    pub failed: Vec<JsonFailure>,
    pub skipped: usize,
    pub bytes_freed: u64,
    pub directories_removed: usize,
}

/// Complete JSON document for a run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub primary: String,
    pub secondary: String,
    pub from_cache: bool,
    pub duplicates: Vec<String>,
    pub summary: JsonSummary,
    pub deletion: Option<JsonDeletion>,
    pub phase: RunPhase,
    pub exit_code: i32,
    pub exit_code_name: String,
}

impl JsonOutput {
    /// Build the document for `report`.
    #[must_use]
    pub fn new(report: &RunReport, exit_code: ExitCode) -> Self {
        let catalog = report.catalog_stats.as_ref();
        let finder = report.finder_stats.as_ref();
        let unreadable = catalog.map_or(0, |s| s.errors.len()) + finder.map_or(0, |s| s.errors.len());
        let scan_duration_ms = match (catalog, finder) {
            (Some(c), Some(f)) => Some((c.duration + f.duration).as_millis() as u64),
            _ => None,
        };

        let deletion = report.delete_requested.then(|| {
            let deleted = report.deleted.as_ref();
            JsonDeletion {
                confirmed: report.confirmed,
                mode: report.delete_mode,
                deleted: deleted.map_or(0, |d| d.success_count()),
                failed: deleted
                    .map(|d| {
                        d.failures
                            .iter()
                            .map(|e| JsonFailure {
                                path: e.path().display().to_string(),
                                error: e.to_string(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                skipped: deleted.map_or(0, |d| d.skipped),
                bytes_freed: deleted.map_or(0, |d| d.bytes_freed),
                directories_removed: report.pruned.as_ref().map_or(0, |p| p.count()),
            }
        });

        Self {
            primary: report.roots.primary.display().to_string(),
            secondary: report.roots.secondary.display().to_string(),
            from_cache: report.from_cache,
            duplicates: report
                .duplicates
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            summary: JsonSummary {
                primary_files: catalog.map(|s| s.files_found),
                secondary_files: finder.map(|s| s.files_scanned),
                skipped_by_size: finder.map(|s| s.skipped_by_size),
                duplicates_found: report.duplicates.len(),
                reclaimable_bytes: report.reclaimable_bytes,
                unreadable,
                scan_duration_ms,
            },
            deletion,
            phase: report.phase,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
