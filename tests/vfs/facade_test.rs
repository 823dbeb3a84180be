/*!
 * Facade Tests
 * Routing, normalization and read/write behaviour of `Vfs`
 */

use tempfile::TempDir;
use unified_vfs::vfs::{Permissions, Vfs, VfsError, VfsKind, VfsOptions};

#[test]
fn test_write_then_read_round_trip() {
    let vfs = Vfs::memory(VfsOptions::default());

    vfs.write_file("/docs/readme.md", b"# readme", Permissions::readwrite())
        .unwrap();

    assert_eq!(vfs.read_file("/docs/readme.md").unwrap(), b"# readme");
    assert_eq!(vfs.read_to_string("docs/readme.md").unwrap(), "# readme");
    assert!(vfs.exists("/docs"));
    assert!(vfs.is_dir("/docs"));
    assert!(!vfs.is_dir("/docs/readme.md"));
}

#[test]
fn test_rewrite_readonly_file() {
    let vfs = Vfs::memory(VfsOptions::default());
    vfs.write_file("/a.txt", b"first", Permissions::readonly())
        .unwrap();
    vfs.write_file("/a.txt", b"second", Permissions::readonly())
        .unwrap();

    assert_eq!(vfs.read_file("/a.txt").unwrap(), b"second");
    assert_eq!(vfs.stat("/a.txt").unwrap().permissions.mode & 0o777, 0o444);

    vfs.copy("/a.txt", "/b.txt").unwrap();
    vfs.write_file("/a.txt", b"third", Permissions::readonly())
        .unwrap();
    vfs.copy("/a.txt", "/b.txt").unwrap();
    assert_eq!(vfs.read_file("/b.txt").unwrap(), b"third");
}

#[test]
fn test_read_missing_surfaces_not_found() {
    let vfs = Vfs::memory(VfsOptions::default());
    let err = vfs.read_file("/missing.txt").unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(vfs.stat("/missing.txt"), Err(VfsError::NotFound(_))));
}

#[test]
fn test_list_files_and_dirs() {
    let vfs = Vfs::memory(VfsOptions::default());
    vfs.write_file("/a.txt", b"a", Permissions::readwrite()).unwrap();
    vfs.write_file("/z.txt", b"z", Permissions::readwrite()).unwrap();
    vfs.mkdir_all("/sub/deeper", Permissions::executable()).unwrap();

    assert_eq!(vfs.list_files("/").unwrap(), vec!["a.txt", "z.txt"]);
    assert_eq!(vfs.list_dirs("/").unwrap(), vec!["sub"]);
    assert_eq!(vfs.list_dirs("/sub").unwrap(), vec!["deeper"]);
}

#[test]
fn test_remove_and_remove_all() {
    let vfs = Vfs::memory(VfsOptions::default());
    vfs.write_file("/tree/a/1.txt", b"1", Permissions::readwrite())
        .unwrap();
    vfs.write_file("/tree/b/2.txt", b"2", Permissions::readwrite())
        .unwrap();

    // Non-empty directories need remove_all
    assert!(vfs.remove("/tree").is_err());

    vfs.remove("/tree/a/1.txt").unwrap();
    assert!(!vfs.exists("/tree/a/1.txt"));

    vfs.remove_all("/tree").unwrap();
    assert!(!vfs.exists("/tree"));
    vfs.remove_all("/tree").unwrap();
}

#[test]
fn test_walk_is_sorted_preorder() {
    let vfs = Vfs::memory(VfsOptions::default());
    for path in ["/b.txt", "/a/2.txt", "/a/1.txt"] {
        vfs.write_file(path, b"x", Permissions::readwrite()).unwrap();
    }

    let mut visited = Vec::new();
    vfs.walk("/", |path, _| {
        visited.push(path.to_string());
        Ok(())
    })
    .unwrap();

    assert_eq!(visited, vec!["/", "/a", "/a/1.txt", "/a/2.txt", "/b.txt"]);
}

#[test]
fn test_walk_stops_on_visitor_error() {
    let vfs = Vfs::memory(VfsOptions::default());
    vfs.write_file("/a.txt", b"a", Permissions::readwrite()).unwrap();
    vfs.write_file("/b.txt", b"b", Permissions::readwrite()).unwrap();

    let mut seen = 0;
    let result = vfs.walk("/", |path, _| {
        seen += 1;
        if path == "/a.txt" {
            return Err(VfsError::InvalidArgument("stop".into()));
        }
        Ok(())
    });

    assert!(matches!(result, Err(VfsError::InvalidArgument(_))));
    assert_eq!(seen, 2);
}

#[test]
fn test_find_files_matches_base_name() {
    let vfs = Vfs::memory(VfsOptions::default());
    for path in ["/src/main.rs", "/src/lib.rs", "/src/util/io.rs", "/README.md"] {
        vfs.write_file(path, b"", Permissions::readwrite()).unwrap();
    }

    assert_eq!(
        vfs.find_files("/", "*.rs").unwrap(),
        vec!["/src/lib.rs", "/src/main.rs", "/src/util/io.rs"]
    );
    assert!(matches!(
        vfs.find_files("/", "[oops"),
        Err(VfsError::InvalidPattern(_))
    ));
}

#[test]
fn test_disk_instance_routes_to_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    let vfs = Vfs::disk(&root, VfsOptions::default()).unwrap();

    assert_eq!(vfs.kind(), VfsKind::Disk);
    assert_eq!(vfs.root(), Some(root.as_path()));

    vfs.write_file("/nested/file.txt", b"on disk", Permissions::readwrite())
        .unwrap();
    assert_eq!(
        std::fs::read(root.join("nested/file.txt")).unwrap(),
        b"on disk"
    );

    // `..` never leaves the root
    vfs.write_file("/../escape.txt", b"x", Permissions::readwrite())
        .unwrap();
    assert!(root.join("escape.txt").exists());
    assert!(!temp.path().join("escape.txt").exists());

    vfs.close().unwrap();
}

#[test]
fn test_disk_root_option_overrides_argument() {
    let temp = TempDir::new().unwrap();
    let preferred = temp.path().join("preferred");
    let vfs = Vfs::disk(
        temp.path().join("ignored"),
        VfsOptions::new().with_root(&preferred),
    )
    .unwrap();

    assert_eq!(vfs.root(), Some(preferred.as_path()));
    assert!(preferred.is_dir());
    assert!(!temp.path().join("ignored").exists());
}

#[cfg(unix)]
#[test]
fn test_disk_write_applies_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let vfs = Vfs::disk(temp.path(), VfsOptions::default()).unwrap();
    vfs.write_file("/run.sh", b"#!/bin/sh", Permissions::executable())
        .unwrap();

    let mode = std::fs::metadata(temp.path().join("run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
    assert_eq!(vfs.stat("/run.sh").unwrap().permissions.mode & 0o777, 0o755);
}
