use dirdedupe::actions::{
    delete_batch, prune_empty_dirs, DeleteConfig, DeleteError, DeleteMode, NoDeleteCallback,
};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tempfile::tempdir;

#[test]
fn test_delete_then_prune_leaves_only_kept_files() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::create_dir_all(root.join("keep")).unwrap();
    fs::write(root.join("a/b/dup1"), "1234567890").unwrap();
    fs::write(root.join("a/dup2"), "123").unwrap();
    fs::write(root.join("keep/own.txt"), "mine").unwrap();

    let targets = vec![root.join("a/b/dup1"), root.join("a/dup2")];
    let config = DeleteConfig::default().with_root(&root);
    let result = delete_batch::<NoDeleteCallback>(&targets, &config, None, None);

    assert_eq!(result.success_count(), 2);
    assert_eq!(result.bytes_freed, 13);

    let pruned = prune_empty_dirs(&root);
    assert_eq!(pruned.removed, vec![root.join("a/b"), root.join("a")]);
    assert!(root.join("keep/own.txt").exists());
    assert!(root.exists());
}

#[test]
fn test_already_gone_file_does_not_abort_batch() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let c = dir.path().join("c");
    fs::write(&a, "a").unwrap();
    fs::write(&c, "ccc").unwrap();
    let targets = vec![a, dir.path().join("b"), c];

    let result = delete_batch::<NoDeleteCallback>(&targets, &DeleteConfig::default(), None, None);

    assert_eq!(result.success_count(), 2);
    assert_eq!(result.bytes_freed, 4);
    assert!(matches!(result.failures[0], DeleteError::NotFound(_)));
    assert_eq!(result.failures[0].path(), dir.path().join("b"));
}

#[test]
fn test_interrupted_batch_touches_nothing() {
    let dir = tempdir().unwrap();
    let targets: Vec<PathBuf> = (0..3)
        .map(|i| {
            let p = dir.path().join(format!("f{}", i));
            fs::write(&p, "x").unwrap();
            p
        })
        .collect();
    let stop = AtomicBool::new(true);

    let result =
        delete_batch::<NoDeleteCallback>(&targets, &DeleteConfig::default(), None, Some(&stop));

    assert_eq!(result.skipped, 3);
    assert!(targets.iter().all(|p| p.exists()));
}

#[test]
fn test_config_modes() {
    assert_eq!(DeleteConfig::default().mode, DeleteMode::Permanent);
    assert_eq!(DeleteConfig::trash().mode, DeleteMode::Trash);
    let config = DeleteConfig::default()
        .with_mode(DeleteMode::Trash)
        .with_root("/data");
    assert_eq!(config.mode, DeleteMode::Trash);
    assert_eq!(config.root, Some(PathBuf::from("/data")));
}

#[cfg(unix)]
#[test]
fn test_permission_denied_is_recorded() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked_dir = dir.path().join("locked");
    fs::create_dir(&locked_dir).unwrap();
    let file = locked_dir.join("f");
    fs::write(&file, "x").unwrap();
    fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o555)).unwrap();

    let result = delete_batch::<NoDeleteCallback>(
        std::slice::from_ref(&file),
        &DeleteConfig::default(),
        None,
        None,
    );
    let still_there = file.exists();
    fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o755)).unwrap();

    // Root bypasses directory permissions.
    if still_there {
        assert_eq!(result.failure_count(), 1);
        assert!(matches!(result.failures[0], DeleteError::PermissionDenied(_)));
        assert_eq!(result.bytes_freed, 0);
    } else {
        assert_eq!(result.success_count(), 1);
    }
}
