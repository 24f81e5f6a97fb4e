//! dirdedupe - remove files from a secondary tree that already exist in a
//! primary tree.
//!
//! Files are matched by content digest, never by name. The pipeline is:
//!
//! 1. [`duplicates::CatalogBuilder`] indexes the primary tree by size and
//!    collects the set of content digests
//! 2. [`duplicates::DuplicateFinder`] walks the secondary tree, skips every
//!    file whose size has no primary counterpart and hashes the rest
//! 3. [`cache::ResultCache`] can stand in for both steps on a later run
//! 4. [`actions`] deletes confirmed duplicates and prunes empty directories
//!
//! [`engine::Engine`] strings these together and always asks for
//! confirmation before deleting anything.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::engine::{Engine, RunOptions};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::prompt::StdinConfirm;
use crate::scanner::WalkerConfig;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, invalid or nested
/// directories, an unreadable root, or an interrupted scan. Use
/// [`ExitCode::for_error`] to map it to an exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref(), &cli.config_overrides())?;
    log::debug!("Effective configuration: {:?}", config);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::Success);
    }

    let (Some(primary), Some(secondary)) = (cli.primary.clone(), cli.secondary.clone()) else {
        anyhow::bail!("both PRIMARY and SECONDARY directories are required");
    };

    let shutdown = signal::install_handler()?;

    let options = RunOptions {
        primary,
        secondary,
        delete: cli.delete,
        delete_mode: config.delete_mode,
        cache: config.cache.clone(),
        workers: config.workers,
        algorithm: config.algorithm,
        walker_config: WalkerConfig::new(config.follow_symlinks, config.ignore_patterns.clone()),
    };

    if !cli.quiet {
        let mut stderr = std::io::stderr();
        if options.delete {
            let rule = "=".repeat(60);
            let mode = if options.delete_mode.is_permanent() {
                "permanently removed"
            } else {
                "moved to the trash"
            };
            writeln!(stderr, "{}", rule)?;
            writeln!(stderr, "DELETE mode: confirmed duplicates will be {}", mode)?;
            writeln!(stderr, "{}", rule)?;
        } else {
            writeln!(stderr, "Report mode: nothing will be deleted (use --delete)")?;
        }
        writeln!(
            stderr,
            "Using {} workers, {} digests",
            options.workers, options.algorithm
        )?;
    }

    let engine = Engine::new(options)
        .with_progress(Arc::new(Progress::new(cli.quiet)))
        .with_shutdown_flag(shutdown.flag());
    let report = engine.run(&StdinConfirm).context("run failed")?;

    let exit_code = if report.was_interrupted() {
        ExitCode::Interrupted
    } else {
        ExitCode::Success
    };

    let mut stdout = std::io::stdout().lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&report).write_to(&mut stdout)?,
        OutputFormat::Json => JsonOutput::new(&report, exit_code).write_to(&mut stdout)?,
    }

    Ok(exit_code)
}
