use dirdedupe::duplicates::{DuplicateFinder, ScanConfig};
use dirdedupe::scanner::{resolve_roots, RootError, WalkerConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_unicode_and_spaces_in_names() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("primär");
    let secondary = dir.path().join("zweite kopie");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(secondary.join("ordner mit leerzeichen")).unwrap();
    fs::write(primary.join("日本語.txt"), "konnichiwa").unwrap();
    fs::write(secondary.join("ordner mit leerzeichen/файл.txt"), "konnichiwa").unwrap();

    let roots = resolve_roots(&primary, &secondary).unwrap();
    let outcome = DuplicateFinder::with_defaults().unwrap().scan(&roots).unwrap();
    assert_eq!(outcome.duplicates.len(), 1);
    assert!(outcome.duplicates[0].ends_with("файл.txt"));
}

#[test]
fn test_sibling_with_common_prefix_is_not_nested() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("data");
    let secondary = dir.path().join("data-backup");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(&secondary).unwrap();

    assert!(resolve_roots(&primary, &secondary).is_ok());
}

#[test]
fn test_trailing_dot_components_are_same_directory() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("child")).unwrap();

    let result = resolve_roots(&root, &root.join("child/.."));
    assert!(matches!(result, Err(RootError::SameDirectory(_))));
}

#[cfg(unix)]
#[test]
fn test_symlinked_root_resolves_to_target() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let result = resolve_roots(&real, &link);
    assert!(matches!(result, Err(RootError::SameDirectory(_))));
}

#[cfg(unix)]
#[test]
fn test_symlinks_inside_trees_are_skipped_by_default() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("p");
    let secondary = dir.path().join("s");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(&secondary).unwrap();
    fs::write(primary.join("a"), "content").unwrap();
    std::os::unix::fs::symlink(primary.join("a"), secondary.join("link_to_a")).unwrap();

    let roots = resolve_roots(&primary, &secondary).unwrap();
    let skipped = DuplicateFinder::with_defaults().unwrap().scan(&roots).unwrap();
    assert!(skipped.duplicates.is_empty());

    let following = ScanConfig::default().with_walker_config(WalkerConfig::new(true, Vec::new()));
    let followed = DuplicateFinder::new(following).unwrap().scan(&roots).unwrap();
    assert_eq!(followed.duplicates.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_hard_links_are_ordinary_files() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("p");
    let secondary = dir.path().join("s");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(&secondary).unwrap();
    fs::write(primary.join("a"), "shared inode").unwrap();
    fs::hard_link(primary.join("a"), secondary.join("b")).unwrap();

    let roots = resolve_roots(&primary, &secondary).unwrap();
    let outcome = DuplicateFinder::with_defaults().unwrap().scan(&roots).unwrap();
    assert_eq!(outcome.duplicates.len(), 1);
}
