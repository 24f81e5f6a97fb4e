//! Report rendering.
//!
//! - [`text`]: human-readable summary with sizes via `bytesize`
//! - [`json`]: machine-readable document for scripting
//!
//! ```no_run
//! use dirdedupe::engine::{Engine, RunOptions};
//! use dirdedupe::output::TextOutput;
//! use dirdedupe::prompt::StdinConfirm;
//!
//! let report = Engine::new(RunOptions::new("/archive", "/backup")).run(&StdinConfirm)?;
//! TextOutput::new(&report).write_to(&mut std::io::stdout())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
