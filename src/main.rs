/*!
 * VFS Demo - Main Entry Point
 *
 * Opens a disk-rooted filesystem, mounts the bundled demo archive, prints
 * the tree and optionally streams change events as JSON lines.
 *
 * Environment:
 * - VFS_ROOT: disk root (default: ./vfs-demo-root, or the first argument)
 * - VFS_WATCH_SECS: stream events for this many seconds before exiting
 */

use include_dir::{include_dir, Dir};
use std::error::Error;
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

use unified_vfs::{init_tracing, Logger, Permissions, Vfs, VfsOptions, WatchEvent};

static DEMO_ARCHIVE: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/testdata");

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let root = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./vfs-demo-root".to_string());
    let opts = VfsOptions::from_env().with_logger(Logger::global());

    let vfs = Vfs::disk(root, opts)?;
    info!(root = ?vfs.root(), kind = %vfs.kind(), "VFS demo starting");

    vfs.register_embedded("demo", &DEMO_ARCHIVE, "")?;
    vfs.write_file("/hello.txt", b"hello from the demo\n", Permissions::readwrite())?;

    {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        vfs.dump(&mut out)?;
        out.flush()?;
    }

    let watch_secs = std::env::var("VFS_WATCH_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    if watch_secs > 0 {
        let mut events = vfs.subscribe()?;
        vfs.watch("/", |event: WatchEvent| {
            if let Some(err) = &event.error {
                warn!(error = %err, pattern = %event.path, "watcher failure");
            }
        })?;

        info!(seconds = watch_secs, "streaming change events");
        let deadline = tokio::time::sleep(Duration::from_secs(watch_secs));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                received = events.recv() => match received {
                    Ok(event) => println!("{}", serde_json::to_string(&event)?),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    vfs.close()?;
    info!("VFS demo finished");
    Ok(())
}
