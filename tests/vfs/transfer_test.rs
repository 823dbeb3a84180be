/*!
 * Transfer Tests
 * Clone independence, merge, and host import/export
 */

use include_dir::{include_dir, Dir};
use std::collections::BTreeMap;
use tempfile::TempDir;

use unified_vfs::vfs::{Permissions, Vfs, VfsError, VfsKind, VfsOptions};

static TESTDATA: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/testdata");

/// Relative path → bytes for every file under `dir`
fn snapshot_host(dir: &std::path::Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/");
                files.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }
    files
}

#[test]
fn test_clone_round_trip_and_independence() {
    let original = Vfs::hybrid(VfsOptions::default());
    original.register_embedded("test", &TESTDATA, "").unwrap();
    original
        .write_file("/a.txt", b"original", Permissions::readwrite())
        .unwrap();
    original
        .write_file("/dir/b.txt", b"nested", Permissions::readwrite())
        .unwrap();

    let clone = original.try_clone().unwrap();
    assert_eq!(clone.kind(), VfsKind::Memory);
    assert_eq!(clone.read_file("/a.txt").unwrap(), b"original");
    assert_eq!(clone.read_file("/dir/b.txt").unwrap(), b"nested");

    // Bundled namespaces are shared, not copied into the mutable tree
    assert_eq!(clone.list_bundled(), vec!["test"]);
    assert!(clone.exists("test://test.txt"));

    clone
        .write_file("/a.txt", b"changed in clone", Permissions::readwrite())
        .unwrap();
    clone.write_file("/only-clone.txt", b"x", Permissions::readwrite()).unwrap();
    original.remove("/dir/b.txt").unwrap();

    assert_eq!(original.read_file("/a.txt").unwrap(), b"original");
    assert!(!original.exists("/only-clone.txt"));
    assert_eq!(clone.read_file("/dir/b.txt").unwrap(), b"nested");
}

#[test]
fn test_clone_of_disk_instance_is_memory_backed() {
    let temp = TempDir::new().unwrap();
    let disk = Vfs::disk(temp.path(), VfsOptions::default()).unwrap();
    disk.write_file("/data.bin", &[1, 2, 3], Permissions::readwrite())
        .unwrap();

    let clone = disk.try_clone().unwrap();
    assert_eq!(clone.root(), None);
    clone.write_file("/data.bin", &[9], Permissions::readwrite()).unwrap();

    assert_eq!(std::fs::read(temp.path().join("data.bin")).unwrap(), vec![1, 2, 3]);
    assert!(matches!(
        clone.watch("/", |_| {}),
        Err(VfsError::WatchUnavailable(_))
    ));
}

#[test]
fn test_merge_reroots_under_destination() {
    let target = Vfs::memory(VfsOptions::default());
    target
        .write_file("/merged/a.txt", b"old", Permissions::readwrite())
        .unwrap();

    let other = Vfs::memory(VfsOptions::default());
    other.write_file("/a.txt", b"new", Permissions::readwrite()).unwrap();
    other
        .write_file("/dir/b.txt", b"deep", Permissions::readonly())
        .unwrap();

    target.merge(&other, "/merged").unwrap();

    // Collisions are overwritten
    assert_eq!(target.read_file("/merged/a.txt").unwrap(), b"new");
    assert_eq!(target.read_file("/merged/dir/b.txt").unwrap(), b"deep");
    assert!(target
        .stat("/merged/dir/b.txt")
        .unwrap()
        .permissions
        .is_readonly());
}

#[test]
fn test_merge_overwrites_readonly_collision() {
    let target = Vfs::memory(VfsOptions::default());
    target
        .write_file("/dest/a.txt", b"old", Permissions::readonly())
        .unwrap();

    let other = Vfs::memory(VfsOptions::default());
    other.write_file("/a.txt", b"new", Permissions::readonly()).unwrap();

    target.merge(&other, "/dest").unwrap();
    assert_eq!(target.read_file("/dest/a.txt").unwrap(), b"new");

    // Merging the same tree again is fine too
    target.merge(&other, "/dest").unwrap();
    assert_eq!(target.read_file("/dest/a.txt").unwrap(), b"new");
}

#[test]
fn test_merge_into_bundled_destination_is_refused() {
    let target = Vfs::hybrid(VfsOptions::default());
    target.register_embedded("test", &TESTDATA, "").unwrap();
    let other = Vfs::memory(VfsOptions::default());
    other.write_file("/x.txt", b"x", Permissions::readwrite()).unwrap();

    assert!(matches!(
        target.merge(&other, "test://x"),
        Err(VfsError::ReadOnlyPath(_))
    ));
}

#[test]
fn test_save_then_load_reproduces_tree() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("export");

    let source = Vfs::memory(VfsOptions::default());
    source
        .write_file("/project/src/main.rs", b"fn main() {}", Permissions::readwrite())
        .unwrap();
    source
        .write_file("/project/run.sh", b"#!/bin/sh", Permissions::executable())
        .unwrap();
    source
        .write_file("/project/README.md", b"# project", Permissions::readwrite())
        .unwrap();

    source.save_to_disk("/project", &out).unwrap();
    assert_eq!(
        snapshot_host(&out).keys().cloned().collect::<Vec<_>>(),
        vec!["README.md", "run.sh", "src/main.rs"]
    );

    let restored = Vfs::memory(VfsOptions::default());
    restored.load_from_disk(&out, "/restored").unwrap();

    for rel in ["src/main.rs", "run.sh", "README.md"] {
        assert_eq!(
            restored.read_file(&format!("/restored/{}", rel)).unwrap(),
            source.read_file(&format!("/project/{}", rel)).unwrap()
        );
    }

    #[cfg(unix)]
    assert_eq!(
        restored.stat("/restored/run.sh").unwrap().permissions.mode & 0o777,
        0o755
    );

    // A second export of the restored tree is byte-identical
    let again = temp.path().join("again");
    restored.save_to_disk("/restored", &again).unwrap();
    assert_eq!(snapshot_host(&out), snapshot_host(&again));
}

#[test]
fn test_save_bundled_is_refused() {
    let temp = TempDir::new().unwrap();
    let vfs = Vfs::hybrid(VfsOptions::default());
    vfs.register_embedded("test", &TESTDATA, "").unwrap();

    assert!(matches!(
        vfs.save_to_disk("test://", temp.path()),
        Err(VfsError::InvalidArgument(_))
    ));
}

#[test]
fn test_load_missing_source_fails() {
    let temp = TempDir::new().unwrap();
    let vfs = Vfs::memory(VfsOptions::default());
    assert!(matches!(
        vfs.load_from_disk(temp.path().join("absent"), "/x"),
        Err(VfsError::NotFound(_))
    ));
}
