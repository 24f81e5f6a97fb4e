use dirdedupe::actions::DeleteMode;
use dirdedupe::engine::{Engine, EngineError, RunOptions, RunPhase};
use dirdedupe::prompt::Confirm;
use dirdedupe::scanner::{RootError, WalkerConfig};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Records every question and answers with a fixed value.
struct Scripted {
    answer: bool,
    questions: RefCell<Vec<String>>,
}

impl Scripted {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            questions: RefCell::new(Vec::new()),
        }
    }

    fn times_asked(&self) -> usize {
        self.questions.borrow().len()
    }
}

impl Confirm for Scripted {
    fn confirm(&self, message: &str) -> bool {
        self.questions.borrow_mut().push(message.to_string());
        self.answer
    }
}

struct Scenario {
    dir: TempDir,
    primary: PathBuf,
    secondary: PathBuf,
}

/// primary/x.txt = "hello"; secondary/nested/deeper/y.txt = "hello",
/// secondary/z.txt = "world"
fn scenario() -> Scenario {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("primary");
    let secondary = dir.path().join("secondary");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(secondary.join("nested/deeper")).unwrap();
    fs::write(primary.join("x.txt"), "hello").unwrap();
    fs::write(secondary.join("nested/deeper/y.txt"), "hello").unwrap();
    fs::write(secondary.join("z.txt"), "world").unwrap();
    Scenario {
        dir,
        primary,
        secondary,
    }
}

fn entries(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            e.unwrap()
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    names.sort();
    names
}

#[test]
fn test_end_to_end_delete_and_prune() {
    let s = scenario();
    let confirm = Scripted::answering(true);
    let report = Engine::new(RunOptions::new(&s.primary, &s.secondary).with_delete(true))
        .run(&confirm)
        .unwrap();

    assert_eq!(report.duplicates.len(), 1);
    assert!(report.duplicates[0].ends_with("y.txt"));
    assert_eq!(confirm.times_asked(), 1);
    assert!(confirm.questions.borrow()[0].contains("1 duplicate file(s)"));
    assert_eq!(report.deleted_count(), 1);
    assert_eq!(report.bytes_freed(), 5);
    assert_eq!(entries(&s.secondary), vec!["z.txt".to_string()]);
    assert_eq!(entries(&s.primary), vec!["x.txt".to_string()]);
    assert_eq!(
        report.transitions,
        vec![
            RunPhase::Idle,
            RunPhase::Scanning,
            RunPhase::DuplicatesKnown,
            RunPhase::AwaitingConfirmation,
            RunPhase::Deleting,
            RunPhase::PruningDirs,
            RunPhase::Done,
        ]
    );
}

#[test]
fn test_rejected_confirmation_changes_nothing() {
    let s = scenario();
    let before = entries(&s.secondary);
    let confirm = Scripted::answering(false);

    let report = Engine::new(RunOptions::new(&s.primary, &s.secondary).with_delete(true))
        .run(&confirm)
        .unwrap();

    assert_eq!(report.deleted_count(), 0);
    assert_eq!(report.phase, RunPhase::Done);
    assert_eq!(entries(&s.secondary), before);
}

#[test]
fn test_cached_run_asks_again_and_deletes() {
    let s = scenario();
    let cache = s.dir.path().join("cache.json");
    let options = RunOptions::new(&s.primary, &s.secondary).with_cache(&cache);

    let first = Engine::new(options.clone()).run(&Scripted::answering(true)).unwrap();
    assert!(!first.from_cache);
    assert!(first.deleted.is_none());

    let confirm = Scripted::answering(true);
    let second = Engine::new(options.with_delete(true)).run(&confirm).unwrap();
    assert!(second.from_cache);
    assert_eq!(confirm.times_asked(), 1);
    assert_eq!(second.deleted_count(), 1);
    assert_eq!(entries(&s.secondary), vec!["z.txt".to_string()]);
}

#[test]
fn test_invalidated_cache_falls_back_to_scan() {
    let s = scenario();
    let cache = s.dir.path().join("cache.json");
    let options = RunOptions::new(&s.primary, &s.secondary).with_cache(&cache);
    Engine::new(options.clone()).run(&Scripted::answering(false)).unwrap();

    // A new copy appears and a cached duplicate vanishes
    fs::remove_file(s.secondary.join("nested/deeper/y.txt")).unwrap();
    fs::write(s.secondary.join("fresh.txt"), "hello").unwrap();

    let report = Engine::new(options).run(&Scripted::answering(false)).unwrap();
    assert!(!report.from_cache);
    assert_eq!(report.duplicates.len(), 1);
    assert!(report.duplicates[0].ends_with("fresh.txt"));
}

#[test]
fn test_repeat_runs_are_idempotent() {
    let s = scenario();
    fs::write(s.primary.join("big.bin"), vec![7u8; 100_000]).unwrap();
    fs::write(s.secondary.join("big-copy.bin"), vec![7u8; 100_000]).unwrap();

    let run = || {
        let mut d = Engine::new(RunOptions::new(&s.primary, &s.secondary).with_workers(3))
            .run(&Scripted::answering(false))
            .unwrap()
            .duplicates;
        d.sort();
        d
    };
    assert_eq!(run(), run());
}

#[test]
fn test_fatal_preconditions() {
    let s = scenario();
    let never = Scripted::answering(true);

    let same = Engine::new(RunOptions::new(&s.primary, &s.primary)).run(&never);
    assert!(matches!(same, Err(EngineError::Root(RootError::SameDirectory(_)))));

    let missing = Engine::new(RunOptions::new(s.dir.path().join("nope"), &s.secondary)).run(&never);
    assert!(matches!(missing, Err(EngineError::Root(RootError::NotFound(_)))));

    let file = Engine::new(RunOptions::new(&s.primary, s.secondary.join("z.txt"))).run(&never);
    assert!(matches!(file, Err(EngineError::Root(RootError::NotADirectory(_)))));

    let nested = Engine::new(RunOptions::new(&s.secondary, s.secondary.join("nested"))).run(&never);
    assert!(matches!(
        nested,
        Err(EngineError::Root(RootError::SecondaryInsidePrimary { .. }))
    ));

    assert_eq!(never.times_asked(), 0);
    assert!(s.secondary.join("nested/deeper/y.txt").exists());
}

#[test]
fn test_trash_mode_reported() {
    let s = scenario();
    let mut options = RunOptions::new(&s.primary, &s.secondary);
    options.delete_mode = DeleteMode::Trash;
    let confirm = Scripted::answering(false);
    let report = Engine::new(options.with_delete(true)).run(&confirm).unwrap();

    assert_eq!(report.delete_mode, DeleteMode::Trash);
    assert!(confirm.questions.borrow()[0].contains("to the trash"));
}

#[cfg(unix)]
#[test]
fn test_followed_link_into_primary_is_never_deleted() {
    let s = scenario();
    std::os::unix::fs::symlink(&s.primary, s.secondary.join("link")).unwrap();
    let mut options = RunOptions::new(&s.primary, &s.secondary).with_delete(true);
    options.walker_config = WalkerConfig::new(true, Vec::new());

    let report = Engine::new(options).run(&Scripted::answering(true)).unwrap();

    assert_eq!(report.duplicates.len(), 1);
    assert!(report.duplicates[0].ends_with("nested/deeper/y.txt"));
    assert_eq!(report.finder_stats.as_ref().unwrap().outside_root, 1);
    assert_eq!(report.deleted_count(), 1);
    assert_eq!(fs::read_to_string(s.primary.join("x.txt")).unwrap(), "hello");
}

#[cfg(unix)]
#[test]
fn test_followed_link_into_secondary_adds_nothing_to_catalog() {
    let s = scenario();
    std::os::unix::fs::symlink(&s.secondary, s.primary.join("link")).unwrap();
    let mut options = RunOptions::new(&s.primary, &s.secondary).with_delete(true);
    options.walker_config = WalkerConfig::new(true, Vec::new());

    let report = Engine::new(options).run(&Scripted::answering(true)).unwrap();

    // z.txt exists only in secondary; reaching it through the link must not
    // make it a copy of itself
    assert_eq!(report.duplicates.len(), 1);
    assert!(s.secondary.join("z.txt").exists());
    assert_eq!(report.catalog_stats.as_ref().unwrap().outside_root, 2);
}

#[test]
fn test_cache_from_wider_scan_is_not_reused_with_exclusions() {
    let s = scenario();
    let cache = s.dir.path().join("cache.json");
    fs::write(s.secondary.join("scratch.tmp"), "hello").unwrap();

    let wide = RunOptions::new(&s.primary, &s.secondary).with_cache(&cache);
    let first = Engine::new(wide.clone()).run(&Scripted::answering(false)).unwrap();
    assert_eq!(first.duplicates.len(), 2);

    let mut narrow = wide.with_delete(true);
    narrow.walker_config = WalkerConfig::new(false, vec!["*.tmp".to_string()]);
    let report = Engine::new(narrow).run(&Scripted::answering(true)).unwrap();

    assert!(!report.from_cache);
    assert_eq!(report.cache_miss, Some(dirdedupe::cache::CacheMiss::OptionsMismatch));
    assert_eq!(report.deleted_count(), 1);
    assert!(s.secondary.join("scratch.tmp").exists());
}

