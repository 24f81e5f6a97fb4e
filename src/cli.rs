//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Report which files in the backup already exist in the archive
//! dirdedupe ~/archive ~/backup
//!
//! # Delete them (asks for confirmation), reusing a cached result if valid
//! dirdedupe ~/archive ~/backup --delete --cache ~/.cache/dedupe.json
//!
//! # JSON report, 8 workers, SHA-256
//! dirdedupe ~/archive ~/backup --output json -w 8 --algorithm sha256
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::actions::DeleteMode;
use crate::config::ConfigOverrides;
use crate::scanner::HashAlgorithm;

/// Remove files from a secondary directory that already exist in a primary one.
///
/// Files are compared by content hash, never by name. Nothing is deleted
/// without --delete and an explicit "yes" at the prompt.
#[derive(Debug, Parser)]
#[command(name = "dirdedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory whose files are kept
    #[arg(value_name = "PRIMARY", required_unless_present = "print_config")]
    pub primary: Option<PathBuf>,

    /// Directory searched for duplicates of PRIMARY's files
    #[arg(value_name = "SECONDARY", required_unless_present = "print_config")]
    pub secondary: Option<PathBuf>,

    /// Delete the duplicates after confirmation
    #[arg(long)]
    pub delete: bool,

    /// Number of hashing workers [default: half the logical CPUs]
    #[arg(short, long, value_name = "N", value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Result cache file (reused when still valid, rewritten after a scan)
    #[arg(short, long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Content digest algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Move duplicates to the trash instead of deleting them permanently
    #[arg(long)]
    pub trash: bool,

    /// Follow symbolic links while scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Gitignore-style pattern to exclude (can be used multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration file [default: platform config dir]/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Settings given on the command line, for the top config layer.
    #[must_use]
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            workers: self.workers,
            algorithm: self.algorithm,
            follow_symlinks: self.follow_symlinks.then_some(true),
            ignore_patterns: (!self.ignore_patterns.is_empty())
                .then(|| self.ignore_patterns.clone()),
            delete_mode: self.trash.then_some(DeleteMode::Trash),
            cache: self.cache.clone(),
        }
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a worker count, rejecting zero.
///
/// # Examples
///
/// ```
/// use dirdedupe::cli::parse_workers;
///
/// assert_eq!(parse_workers("4"), Ok(4));
/// assert!(parse_workers("0").is_err());
/// ```
pub fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid worker count: '{}'", s))?;
    if n == 0 {
        return Err("Worker count must be at least 1".to_string());
    }
    Ok(n)
}
