/*!
 * Watch Tests
 * Change notification on disk-backed instances
 */

use std::time::Duration;
use tempfile::TempDir;
use unified_vfs::vfs::{Permissions, Vfs, VfsError, VfsOptions, WatchEvent, WatchOp};

const WAIT: Duration = Duration::from_secs(5);
const SETTLE: Duration = Duration::from_millis(300);

fn disk_vfs() -> (TempDir, Vfs) {
    let temp = TempDir::new().unwrap();
    let vfs = Vfs::disk(temp.path(), VfsOptions::default()).unwrap();
    (temp, vfs)
}

/// Wait for an event on `path`, skipping unrelated ones
fn wait_for(rx: &flume::Receiver<WatchEvent>, path: &str) -> Option<WatchEvent> {
    let deadline = std::time::Instant::now() + WAIT;
    while let Some(left) = deadline.checked_duration_since(std::time::Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(event) if event.path == path => return Some(event),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    None
}

#[test]
fn test_write_produces_event() {
    let (_temp, vfs) = disk_vfs();
    let (tx, rx) = flume::unbounded();
    vfs.watch("/", move |event| {
        let _ = tx.send(event);
    })
    .unwrap();
    assert!(vfs.is_watching("/"));

    vfs.write_file("/created.txt", b"one", Permissions::readwrite())
        .unwrap();
    let event = wait_for(&rx, "/created.txt").expect("no event for new file");
    assert!(matches!(event.op, WatchOp::Create | WatchOp::Write | WatchOp::AttributeChange));
    assert!(!event.is_dir);
    assert!(!event.is_error());

    vfs.write_file("/created.txt", b"two", Permissions::readwrite())
        .unwrap();
    assert!(wait_for(&rx, "/created.txt").is_some());
}

#[test]
fn test_stop_all_silences_callbacks() {
    let (_temp, vfs) = disk_vfs();
    let (tx, rx) = flume::unbounded();
    vfs.watch("/", move |event| {
        let _ = tx.send(event);
    })
    .unwrap();

    vfs.write_file("/before.txt", b"x", Permissions::readwrite()).unwrap();
    assert!(wait_for(&rx, "/before.txt").is_some());

    vfs.stop_all_watches().unwrap();
    assert!(!vfs.is_watching("/"));
    std::thread::sleep(SETTLE);
    while rx.try_recv().is_ok() {}

    vfs.write_file("/after.txt", b"x", Permissions::readwrite()).unwrap();
    assert!(rx.recv_timeout(SETTLE).is_err());
}

#[test]
fn test_panicking_callback_is_contained() {
    let (_temp, vfs) = disk_vfs();
    vfs.watch("/", |_| panic!("callback failure")).unwrap();

    let (tx, rx) = flume::unbounded();
    vfs.watch("/*.txt", move |event| {
        let _ = tx.send(event);
    })
    .unwrap();

    vfs.write_file("/first.txt", b"1", Permissions::readwrite()).unwrap();
    assert!(wait_for(&rx, "/first.txt").is_some());

    // The loop survives the panic and keeps delivering
    vfs.write_file("/second.txt", b"2", Permissions::readwrite()).unwrap();
    assert!(wait_for(&rx, "/second.txt").is_some());
}

#[test]
fn test_glob_pattern_filters_events() {
    let (_temp, vfs) = disk_vfs();
    let (tx, rx) = flume::unbounded();
    vfs.watch("/*.log", move |event| {
        let _ = tx.send(event);
    })
    .unwrap();

    vfs.write_file("/notes.txt", b"skip", Permissions::readwrite()).unwrap();
    vfs.write_file("/app.log", b"keep", Permissions::readwrite()).unwrap();

    assert!(wait_for(&rx, "/app.log").is_some());
    std::thread::sleep(SETTLE);
    while let Ok(event) = rx.try_recv() {
        assert!(event.path.ends_with(".log"), "unexpected event {}", event.path);
    }
}

#[test]
fn test_subdirectory_pattern() {
    let (_temp, vfs) = disk_vfs();
    vfs.mkdir_all("/logs", Permissions::executable()).unwrap();

    let (tx, rx) = flume::unbounded();
    vfs.watch("/logs", move |event| {
        let _ = tx.send(event);
    })
    .unwrap();

    vfs.write_file("/logs/today.log", b"entry", Permissions::readwrite())
        .unwrap();
    assert!(wait_for(&rx, "/logs/today.log").is_some());
}

#[test]
fn test_watch_missing_directory_fails() {
    let (_temp, vfs) = disk_vfs();
    assert!(vfs.watch("/absent", |_| {}).is_err());
    assert!(!vfs.is_watching("/absent"));
}

#[test]
fn test_memory_instance_cannot_watch() {
    let vfs = Vfs::memory(VfsOptions::default());
    assert!(matches!(
        vfs.watch("/", |_| {}),
        Err(VfsError::WatchUnavailable(_))
    ));
    assert!(!vfs.is_watching("/"));
    assert!(vfs.subscribe().is_err());
    vfs.close().unwrap();
}

#[test]
fn test_close_is_idempotent() {
    let (_temp, vfs) = disk_vfs();
    vfs.watch("/", |_| {}).unwrap();

    vfs.close().unwrap();
    vfs.close().unwrap();

    assert!(!vfs.is_watching("/"));
    assert!(matches!(
        vfs.watch("/", |_| {}),
        Err(VfsError::WatchUnavailable(_))
    ));
    assert!(vfs.stop_watch("/").is_ok());
    assert!(vfs.stop_all_watches().is_ok());
    assert!(vfs.subscribe().is_err());

    // Reads and writes are unaffected
    vfs.write_file("/still.txt", b"ok", Permissions::readwrite()).unwrap();
    assert_eq!(vfs.read_file("/still.txt").unwrap(), b"ok");
}

#[tokio::test]
async fn test_subscriber_sees_events() {
    let (_temp, vfs) = disk_vfs();
    let mut events = vfs.subscribe().unwrap();
    vfs.watch("/", |_| {}).unwrap();

    vfs.write_file("/broadcast.txt", b"x", Permissions::readwrite())
        .unwrap();

    let seen = tokio::time::timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(event) if event.path == "/broadcast.txt" => return event,
                Ok(_) => continue,
                Err(e) => panic!("subscriber closed: {}", e),
            }
        }
    })
    .await
    .expect("no broadcast event");
    assert!(!seen.is_error());
}
