use dirdedupe::duplicates::{DuplicateFinder, FinderError, ScanConfig};
use dirdedupe::scanner::{resolve_roots, HashAlgorithm, RootPair, WalkerConfig};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("primary");
    let secondary = dir.path().join("secondary");
    fs::create_dir(&primary).unwrap();
    fs::create_dir(&secondary).unwrap();
    (dir, primary, secondary)
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn roots(primary: &Path, secondary: &Path) -> RootPair {
    resolve_roots(primary, secondary).unwrap()
}

fn relative(outcome: &[PathBuf], root: &Path) -> HashSet<String> {
    outcome
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn test_scan_empty_trees() {
    let (_dir, primary, secondary) = setup();
    let finder = DuplicateFinder::with_defaults().unwrap();
    let outcome = finder.scan(&roots(&primary, &secondary)).unwrap();

    assert!(outcome.duplicates.is_empty());
    assert_eq!(outcome.catalog_stats.files_found, 0);
    assert_eq!(outcome.finder_stats.files_scanned, 0);
}

#[test]
fn test_copies_found_regardless_of_name_and_location() {
    let (_dir, primary, secondary) = setup();
    write(&primary, "photos/2020/a.jpg", b"jpeg data one");
    write(&primary, "docs/notes.md", b"# notes");
    write(&secondary, "random/name.bin", b"jpeg data one");
    write(&secondary, "notes-copy.md", b"# notes");
    write(&secondary, "unique.txt", b"only here");

    let r = roots(&primary, &secondary);
    let outcome = DuplicateFinder::with_defaults().unwrap().scan(&r).unwrap();

    let expected: HashSet<String> = ["random/name.bin", "notes-copy.md"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(relative(&outcome.duplicates, &r.secondary), expected);
}

#[test]
fn test_multiple_copies_of_one_primary_file() {
    let (_dir, primary, secondary) = setup();
    write(&primary, "orig", b"same");
    for name in ["c1", "c2", "nested/c3"] {
        write(&secondary, name, b"same");
    }

    let outcome = DuplicateFinder::with_defaults()
        .unwrap()
        .scan(&roots(&primary, &secondary))
        .unwrap();
    assert_eq!(outcome.duplicates.len(), 3);
}

#[test]
fn test_duplicates_within_primary_collapse() {
    let (_dir, primary, secondary) = setup();
    write(&primary, "a", b"twin");
    write(&primary, "b", b"twin");
    write(&secondary, "c", b"twin");

    let outcome = DuplicateFinder::with_defaults()
        .unwrap()
        .scan(&roots(&primary, &secondary))
        .unwrap();
    assert_eq!(outcome.catalog_stats.files_found, 2);
    assert_eq!(outcome.catalog_stats.unique_digests, 1);
    assert_eq!(outcome.duplicates.len(), 1);
}

#[test]
fn test_size_prefilter_counts() {
    let (_dir, primary, secondary) = setup();
    write(&primary, "p", b"12345");
    write(&secondary, "same_size_other", b"abcde");
    write(&secondary, "bigger", b"123456");
    write(&secondary, "smaller", b"1234");

    let finder = DuplicateFinder::new(ScanConfig::default().with_workers(1)).unwrap();
    let outcome = finder.scan(&roots(&primary, &secondary)).unwrap();

    assert!(outcome.duplicates.is_empty());
    assert_eq!(outcome.finder_stats.files_scanned, 3);
    assert_eq!(outcome.finder_stats.skipped_by_size, 2);
    assert_eq!(outcome.finder_stats.candidates, 1);
    // one primary file plus the single candidate
    assert_eq!(finder.hasher().hash_calls(), 2);
}

#[test]
fn test_large_file_spanning_many_chunks() {
    let (_dir, primary, secondary) = setup();
    let big: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    let mut changed = big.clone();
    *changed.last_mut().unwrap() ^= 0xff;
    write(&primary, "big.bin", &big);
    write(&secondary, "same.bin", &big);
    write(&secondary, "last_byte_differs.bin", &changed);

    for algorithm in [HashAlgorithm::Blake3, HashAlgorithm::Sha256, HashAlgorithm::Md5] {
        let finder = DuplicateFinder::new(ScanConfig::default().with_algorithm(algorithm)).unwrap();
        let r = roots(&primary, &secondary);
        let outcome = finder.scan(&r).unwrap();
        assert_eq!(
            relative(&outcome.duplicates, &r.secondary),
            ["same.bin".to_string()].into_iter().collect(),
            "algorithm {}",
            algorithm
        );
    }
}

#[test]
fn test_ignore_patterns_apply_to_both_trees() {
    let (_dir, primary, secondary) = setup();
    write(&primary, "keep.txt", b"k");
    write(&primary, "skip.tmp", b"t");
    write(&secondary, "keep_copy.txt", b"k");
    write(&secondary, "skip_copy.tmp", b"t");
    write(&secondary, "cache/keep_again.txt", b"k");

    let config = ScanConfig::default().with_walker_config(WalkerConfig::new(
        false,
        vec!["*.tmp".to_string(), "cache/".to_string()],
    ));
    let r = roots(&primary, &secondary);
    let outcome = DuplicateFinder::new(config).unwrap().scan(&r).unwrap();

    assert_eq!(
        relative(&outcome.duplicates, &r.secondary),
        ["keep_copy.txt".to_string()].into_iter().collect()
    );
    assert_eq!(outcome.catalog_stats.files_found, 1);
}

#[test]
fn test_worker_count_does_not_change_result() {
    let (_dir, primary, secondary) = setup();
    for i in 0..30 {
        write(&primary, &format!("p{}", i), format!("content {}", i).as_bytes());
        if i % 3 == 0 {
            write(&secondary, &format!("dir{}/s{}", i % 4, i), format!("content {}", i).as_bytes());
        }
    }
    let r = roots(&primary, &secondary);

    let one: HashSet<_> = DuplicateFinder::new(ScanConfig::default().with_workers(1))
        .unwrap()
        .scan(&r)
        .unwrap()
        .duplicates
        .into_iter()
        .collect();
    let eight: HashSet<_> = DuplicateFinder::new(ScanConfig::default().with_workers(8))
        .unwrap()
        .scan(&r)
        .unwrap()
        .duplicates
        .into_iter()
        .collect();

    assert_eq!(one.len(), 10);
    assert_eq!(one, eight);
}

#[test]
fn test_unreadable_secondary_root_is_fatal() {
    let (_dir, primary, secondary) = setup();
    let r = roots(&primary, &secondary);
    fs::remove_dir(&secondary).unwrap();

    let result = DuplicateFinder::with_defaults().unwrap().scan(&r);
    assert!(matches!(result, Err(FinderError::RootUnreadable(_))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, primary, secondary) = setup();
    write(&primary, "a", b"data");
    write(&secondary, "copy", b"data");
    write(&secondary, "locked", b"data");
    let locked = secondary.join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; only check when the file is really unreadable.
    let really_locked = fs::File::open(&locked).is_err();
    let outcome = DuplicateFinder::with_defaults()
        .unwrap()
        .scan(&roots(&primary, &secondary))
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    if really_locked {
        assert_eq!(outcome.duplicates.len(), 1);
        assert_eq!(outcome.finder_stats.hash_errors, 1);
        assert_eq!(outcome.finder_stats.errors.len(), 1);
    } else {
        assert_eq!(outcome.duplicates.len(), 2);
    }
}
