/*!
 * Dump Tests
 */

use include_dir::{include_dir, Dir};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use unified_vfs::vfs::{MemFS, Permissions, Vfs, VfsOptions};

static TESTDATA: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/testdata");

fn render(vfs: &Vfs) -> String {
    let mut out = Vec::new();
    vfs.dump(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_empty_instance_prints_header_only() {
    assert_eq!(render(&Vfs::memory(VfsOptions::default())), "--- VFS Root ---\n");
    assert_eq!(render(&Vfs::hybrid(VfsOptions::default())), "--- VFS Root ---\n");
}

#[test]
fn test_root_tree() {
    let vfs = Vfs::memory(VfsOptions::default());
    vfs.write_file("/dir/b.txt", b"b", Permissions::readwrite()).unwrap();
    vfs.write_file("/a.txt", b"a", Permissions::readwrite()).unwrap();

    assert_eq!(
        render(&vfs),
        "--- VFS Root ---\n├── a.txt\n└── dir\n    └── b.txt\n"
    );
}

#[test]
fn test_bundled_section() {
    let vfs = Vfs::hybrid(VfsOptions::default());
    vfs.register_embedded("test", &TESTDATA, "").unwrap();
    vfs.write_file("/a.txt", b"a", Permissions::readwrite()).unwrap();

    let expected = [
        "--- VFS Root ---",
        "└── a.txt",
        "",
        "--- Bundled Filesystems ---",
        "Bundle [test://]:",
        "  ├── nested",
        "  │   └── inner.txt",
        "  ├── templates",
        "  │   ├── base.lib",
        "  │   └── page.html",
        "  └── test.txt",
        "",
    ]
    .join("\n");
    assert_eq!(render(&vfs), expected);
}

#[test]
fn test_bundled_section_follows_subdir() {
    let vfs = Vfs::hybrid(VfsOptions::default());
    vfs.register_embedded("tpl", &TESTDATA, "templates").unwrap();

    let expected = [
        "--- VFS Root ---",
        "",
        "--- Bundled Filesystems ---",
        "Bundle [tpl://]:",
        "  ├── base.lib",
        "  └── page.html",
        "",
    ]
    .join("\n");
    assert_eq!(render(&vfs), expected);
}

#[test]
fn test_missing_bundle_subdir_does_not_stop_dump() {
    let vfs = Vfs::hybrid(VfsOptions::default());
    vfs.register_bundled("broken", Arc::new(MemFS::new()), "absent")
        .unwrap();
    vfs.register_embedded("tpl", &TESTDATA, "templates").unwrap();

    let expected = [
        "--- VFS Root ---",
        "",
        "--- Bundled Filesystems ---",
        "Bundle [broken://]:",
        "Bundle [tpl://]:",
        "  ├── base.lib",
        "  └── page.html",
        "",
    ]
    .join("\n");
    assert_eq!(render(&vfs), expected);
}
