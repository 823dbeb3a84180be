/*!
 * MemFS Tests
 * Store-level behaviour of the in-memory backend
 */

use std::path::Path;

use unified_vfs::vfs::memory::MemFS;
use unified_vfs::vfs::traits::FileSystem;
use unified_vfs::vfs::types::{Permissions, VfsError};

#[test]
fn test_memfs_basic() {
    let fs = MemFS::new();

    // Write and read
    fs.write(Path::new("/test.txt"), b"hello").unwrap();
    let data = fs.read(Path::new("/test.txt")).unwrap();
    assert_eq!(data, b"hello");

    // Exists
    assert!(fs.exists(Path::new("/test.txt")));
    assert!(!fs.exists(Path::new("/missing.txt")));

    // Delete
    fs.delete(Path::new("/test.txt")).unwrap();
    assert!(!fs.exists(Path::new("/test.txt")));
}

#[test]
fn test_memfs_directories() {
    let fs = MemFS::new();

    fs.create_dir(Path::new("/testdir")).unwrap();
    assert!(fs.exists(Path::new("/testdir")));

    fs.create_dir(Path::new("/testdir/nested")).unwrap();
    assert!(fs.exists(Path::new("/testdir/nested")));

    fs.write(Path::new("/testdir/file.txt"), b"content").unwrap();
    let entries = fs.list_dir(Path::new("/testdir")).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "file.txt");
    assert!(entries[1].is_dir());
}

#[test]
fn test_missing_read_is_not_found() {
    let fs = MemFS::new();
    assert!(matches!(
        fs.read(Path::new("/nope.txt")),
        Err(VfsError::NotFound(_))
    ));
}

#[test]
fn test_mode_bits_are_metadata_only() {
    let fs = MemFS::new();
    fs.write(Path::new("/frozen.txt"), b"v1").unwrap();
    fs.set_permissions(Path::new("/frozen.txt"), Permissions::readonly())
        .unwrap();

    fs.write(Path::new("/frozen.txt"), b"v2").unwrap();
    assert_eq!(fs.read(Path::new("/frozen.txt")).unwrap(), b"v2");
    assert!(fs
        .metadata(Path::new("/frozen.txt"))
        .unwrap()
        .permissions
        .is_readonly());
}

#[test]
fn test_path_normalization() {
    let fs = MemFS::new();

    fs.write(Path::new("/test.txt"), b"hello").unwrap();

    // Different path representations should work
    assert!(fs.exists(Path::new("test.txt")));
    assert!(fs.exists(Path::new("/test.txt")));
    assert!(fs.exists(Path::new("//test.txt")));
}

#[test]
fn test_clone_handle_shares_tree() {
    let fs = MemFS::new();
    let handle = fs.clone();

    handle.write(Path::new("/shared.txt"), b"x").unwrap();
    assert!(fs.exists(Path::new("/shared.txt")));
    assert_eq!(fs.node_count(), 2);
}
