use dirdedupe::cache::{CacheLookup, CacheMiss, CacheRecord, ResultCache, CACHE_VERSION};
use dirdedupe::duplicates::DuplicateFinder;
use dirdedupe::scanner::{resolve_roots, RootPair};
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

struct Fixture {
    dir: TempDir,
    roots: RootPair,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("primary");
        let secondary = dir.path().join("secondary");
        fs::create_dir_all(&primary).unwrap();
        fs::create_dir_all(secondary.join("sub")).unwrap();
        fs::write(primary.join("x.txt"), "hello").unwrap();
        fs::write(primary.join("w.txt"), "world!").unwrap();
        fs::write(secondary.join("y.txt"), "hello").unwrap();
        fs::write(secondary.join("sub/w2.txt"), "world!").unwrap();
        fs::write(secondary.join("z.txt"), "other").unwrap();
        let roots = resolve_roots(&primary, &secondary).unwrap();
        Self { dir, roots }
    }

    fn cache(&self) -> ResultCache {
        ResultCache::new(self.dir.path().join("state/cache.json"))
    }

    fn scan(&self) -> Vec<PathBuf> {
        DuplicateFinder::with_defaults()
            .unwrap()
            .scan(&self.roots)
            .unwrap()
            .duplicates
    }
}

#[test]
fn test_scan_save_load_round_trip() {
    let f = Fixture::new();
    let dupes = f.scan();
    assert_eq!(dupes.len(), 2);

    f.cache().save(&f.roots, &dupes).unwrap();
    assert_eq!(f.cache().load(&f.roots), CacheLookup::Hit(dupes));
}

#[test]
fn test_file_removed_externally_invalidates() {
    let f = Fixture::new();
    let dupes = f.scan();
    f.cache().save(&f.roots, &dupes).unwrap();

    fs::remove_file(&dupes[0]).unwrap();
    assert_eq!(
        f.cache().load(&f.roots),
        CacheLookup::Miss(CacheMiss::MissingFiles(1))
    );
}

#[test]
fn test_record_is_human_readable_json() {
    let f = Fixture::new();
    let dupes = f.scan();
    let cache = f.cache();
    cache.save(&f.roots, &dupes).unwrap();

    let text = fs::read_to_string(cache.path()).unwrap();
    assert!(text.contains('\n'));
    let record: CacheRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(record.version, Some(CACHE_VERSION));
    assert_eq!(record.primary, f.roots.primary);
    assert_eq!(record.secondary, f.roots.secondary);
    assert_eq!(record.duplicates, dupes);
}

#[test]
fn test_relative_paths_resolve_to_same_record() {
    let f = Fixture::new();
    let dupes = f.scan();
    f.cache().save(&f.roots, &dupes).unwrap();

    let dotted_primary = f.dir.path().join("secondary/../primary");
    let again = resolve_roots(&dotted_primary, &f.roots.secondary).unwrap();
    assert_eq!(f.cache().load(&again), CacheLookup::Hit(dupes));
}

#[test]
fn test_swapped_roots_miss() {
    let f = Fixture::new();
    f.cache().save(&f.roots, &f.scan()).unwrap();

    let swapped = RootPair {
        primary: f.roots.secondary.clone(),
        secondary: f.roots.primary.clone(),
    };
    assert_eq!(
        f.cache().load(&swapped),
        CacheLookup::Miss(CacheMiss::PrimaryMismatch)
    );
}

#[test]
fn test_truncated_file_is_malformed() {
    let f = Fixture::new();
    let cache = f.cache();
    cache.save(&f.roots, &f.scan()).unwrap();

    let text = fs::read_to_string(cache.path()).unwrap();
    fs::write(cache.path(), &text[..text.len() / 2]).unwrap();
    assert!(matches!(
        cache.load(&f.roots),
        CacheLookup::Miss(CacheMiss::Malformed(_))
    ));
}

#[test]
fn test_wrong_shape_is_malformed() {
    let f = Fixture::new();
    let cache = f.cache();
    fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
    fs::write(cache.path(), r#"{"primary": 1, "secondary": [], "duplicates": "x"}"#).unwrap();
    assert!(matches!(
        cache.load(&f.roots),
        CacheLookup::Miss(CacheMiss::Malformed(_))
    ));
}

#[test]
fn test_cache_path_is_a_directory() {
    let f = Fixture::new();
    let cache = ResultCache::new(f.dir.path());
    assert!(matches!(
        cache.load(&f.roots),
        CacheLookup::Miss(CacheMiss::Unreadable(_))
    ));
}
