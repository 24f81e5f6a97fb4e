//! Actions applied to confirmed duplicates.
//!
//! - [`delete`]: remove duplicates permanently or to the system trash
//! - [`prune`]: remove directories the deletion left empty
//!
//! Both run sequentially on the calling thread, deletion first.
//!
//! ```no_run
//! use dirdedupe::actions::{delete_batch, prune_empty_dirs, DeleteConfig, NoDeleteCallback};
//! use std::path::{Path, PathBuf};
//!
//! let root = Path::new("/backup");
//! let paths = vec![root.join("old/copy.txt")];
//! let config = DeleteConfig::default().with_root(root);
//! let result = delete_batch::<NoDeleteCallback>(&paths, &config, None, None);
//! let pruned = prune_empty_dirs(root);
//! println!("{}; removed {} directories", result.summary(), pruned.count());
//! ```

pub mod delete;
pub mod prune;

pub use delete::{
    delete_batch, delete_file, delete_to_trash, permanent_delete, BatchDeleteResult,
    DeleteConfig, DeleteError, DeleteMode, DeleteProgressCallback, DeleteResult,
    NoDeleteCallback,
};
pub use prune::{prune_empty_dirs, PruneResult};
