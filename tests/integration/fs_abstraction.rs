// tests/integration/fs_abstraction.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use incbuild::engine::ProjectEvent;
use incbuild::fs::{walk_files, FileSystem, MockFileSystem};
use incbuild::watch::hash::{compute_file_hash, record_if_changed};
use incbuild::watch::patterns::collect_matching_files;
use incbuild::watch::{classify_change, FileHashStore, HashStore, MemoryHashStore, SourceFilter};

fn java_filter(use_hash: bool) -> SourceFilter {
    SourceFilter::new(
        &["**/*.java".to_string()],
        &["generated/**".to_string()],
        use_hash,
    )
    .unwrap()
}

#[test]
fn test_hash_with_mock_fs() {
    let fs = MockFileSystem::new();
    fs.add_file("/test/file.txt", "hello world");

    let hash = compute_file_hash(&fs, Path::new("/test/file.txt")).unwrap();

    assert_eq!(
        hash,
        "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
    );
}

#[test]
fn test_walk_files_lists_files_before_subdirectories() {
    let fs = MockFileSystem::new();
    fs.add_file("src/b/Two.java", "");
    fs.add_file("src/Top.java", "");
    fs.add_file("src/a/One.java", "");
    fs.add_file("src/a/deep/Three.java", "");

    let files = walk_files(&fs, Path::new("src")).unwrap();

    assert_eq!(
        files,
        vec![
            PathBuf::from("src/Top.java"),
            PathBuf::from("src/a/One.java"),
            PathBuf::from("src/a/deep/Three.java"),
            PathBuf::from("src/b/Two.java"),
        ]
    );
}

#[test]
fn test_source_filter_include_and_exclude() {
    let filter = java_filter(false);

    assert!(filter.matches("Foo.java"));
    assert!(filter.matches("pkg/sub/Foo.java"));
    assert!(!filter.matches("pkg/Foo.class"));
    assert!(!filter.matches("generated/Stub.java"));
}

#[test]
fn test_collect_matching_files_uses_filter() {
    let fs = MockFileSystem::new();
    fs.add_file("src/pkg/A.java", "");
    fs.add_file("src/pkg/notes.txt", "");
    fs.add_file("src/generated/Stub.java", "");

    let files = collect_matching_files(&fs, Path::new("src"), &java_filter(false)).unwrap();

    assert_eq!(files, vec![PathBuf::from("src/pkg/A.java")]);
}

#[test]
fn test_classify_change_reports_modification_and_removal() {
    let fs = MockFileSystem::new();
    fs.add_file("src/A.java", "class A {}");
    let root = Path::new("src");
    let filter = java_filter(false);

    let changed = classify_change(&fs, root, Path::new("src/A.java"), &filter, None);
    assert!(matches!(
        changed,
        Some(ProjectEvent::SourceChanged { ref path }) if path == Path::new("src/A.java")
    ));

    fs.remove_file("src/A.java");
    let removed = classify_change(&fs, root, Path::new("src/A.java"), &filter, None);
    assert!(matches!(removed, Some(ProjectEvent::SourceRemoved { .. })));
}

#[test]
fn test_classify_change_ignores_filtered_and_outside_paths() {
    let fs = MockFileSystem::new();
    fs.add_file("src/generated/Stub.java", "");
    fs.add_file("src/README.md", "");
    fs.add_file("other/B.java", "");
    let root = Path::new("src");
    let filter = java_filter(false);

    for path in ["src/generated/Stub.java", "src/README.md", "other/B.java"] {
        assert!(
            classify_change(&fs, root, Path::new(path), &filter, None).is_none(),
            "{path}"
        );
    }
}

#[test]
fn test_unchanged_hash_suppresses_event() {
    let fs = MockFileSystem::new();
    fs.add_file("src/A.java", "class A {}");
    let root = Path::new("src");
    let path = Path::new("src/A.java");
    let filter = java_filter(true);
    let mut store: Box<dyn HashStore> = Box::new(MemoryHashStore::new());

    // First sighting counts as a change and records the hash.
    assert!(classify_change(&fs, root, path, &filter, Some(store.as_mut())).is_some());
    // Touch without content change.
    fs.add_file("src/A.java", "class A {}");
    assert!(classify_change(&fs, root, path, &filter, Some(store.as_mut())).is_none());

    fs.add_file("src/A.java", "class A { int x; }");
    assert!(classify_change(&fs, root, path, &filter, Some(store.as_mut())).is_some());

    fs.remove_file("src/A.java");
    assert!(matches!(
        classify_change(&fs, root, path, &filter, Some(store.as_mut())),
        Some(ProjectEvent::SourceRemoved { .. })
    ));
    assert_eq!(store.load("A.java").unwrap(), None);
}

#[test]
fn test_record_if_changed_memory_store() {
    let mut store = MemoryHashStore::new();

    assert!(record_if_changed(&mut store, "A.java", "h1").unwrap());
    assert!(!record_if_changed(&mut store, "A.java", "h1").unwrap());
    assert!(record_if_changed(&mut store, "A.java", "h2").unwrap());
    assert_eq!(store.load("A.java").unwrap().as_deref(), Some("h2"));
}

#[test]
fn test_file_hash_store_with_mock_fs() {
    let mock = MockFileSystem::new();
    let fs: Arc<dyn FileSystem> = Arc::new(mock.clone());
    let mut store = FileHashStore::new(PathBuf::from("proj"), fs);

    assert_eq!(store.load("pkg/A.java").unwrap(), None);

    store.save("pkg/B.java", "bbb").unwrap();
    store.save("pkg/A.java", "aaa").unwrap();
    store.save("dir with space/C.java", "ccc").unwrap();

    let text = mock
        .read_to_string(Path::new("proj/.incbuild/hashes"))
        .unwrap();
    assert_eq!(
        text,
        "dir with space/C.java ccc\npkg/A.java aaa\npkg/B.java bbb\n"
    );
    assert_eq!(
        store.load("dir with space/C.java").unwrap().as_deref(),
        Some("ccc")
    );

    store.forget("pkg/B.java").unwrap();
    assert_eq!(store.load("pkg/B.java").unwrap(), None);
    assert_eq!(store.load("pkg/A.java").unwrap().as_deref(), Some("aaa"));
}
