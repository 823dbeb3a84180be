/*!
 * Watch Subsystem
 * Native change notification for disk instances, translated to logical
 * paths and fanned out to pattern callbacks
 */

mod event;
mod matcher;
mod observable;

pub use event::{WatchEvent, WatchOp};
pub use matcher::WatchPattern;
pub use observable::EventBroadcaster;

use ahash::RandomState;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::config::Logger;
use super::types::{VfsError, VfsResult};
use event::{detect_is_dir, op_from_kind};

/// Callback invoked for every matching event
pub type WatchCallback = Arc<dyn Fn(WatchEvent) + Send + Sync + 'static>;

/// Lifecycle of a watch manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Unstarted,
    Active,
    Closed,
}

enum LoopMsg {
    Native(notify::Result<notify::Event>),
    Shutdown,
}

struct Registration {
    pattern: WatchPattern,
    callback: WatchCallback,
    native: PathBuf,
}

/// State read by the event loop
struct Shared {
    root: PathBuf,
    canonical_root: PathBuf,
    watches: RwLock<HashMap<String, Registration, RandomState>>,
    events: EventBroadcaster,
    logger: Logger,
}

/// State touched only by registration calls and close
struct Control {
    state: WatchState,
    watcher: Option<RecommendedWatcher>,
    shutdown: Option<flume::Sender<LoopMsg>>,
    event_loop: Option<JoinHandle<()>>,
    /// Native registrations shared by several patterns
    native_refs: HashMap<PathBuf, usize, RandomState>,
}

/// Watches a disk root on behalf of one instance
///
/// Lock order is `control` then `shared.watches`. The event loop only
/// takes `watches`, for reading, and never while running a callback.
pub struct WatchManager {
    shared: Arc<Shared>,
    control: Mutex<Control>,
}

impl WatchManager {
    pub fn new<P: Into<PathBuf>>(root: P, logger: Logger, event_capacity: usize) -> Self {
        let root = root.into();
        let canonical_root = std::fs::canonicalize(&root).unwrap_or_else(|_| root.clone());
        Self {
            shared: Arc::new(Shared {
                root,
                canonical_root,
                watches: RwLock::new(HashMap::default()),
                events: EventBroadcaster::new(event_capacity),
                logger,
            }),
            control: Mutex::new(Control {
                state: WatchState::Unstarted,
                watcher: None,
                shutdown: None,
                event_loop: None,
                native_refs: HashMap::default(),
            }),
        }
    }

    /// Create the native watcher and start the event loop
    pub fn start(&self) -> VfsResult<()> {
        let mut control = self.control.lock();
        match control.state {
            WatchState::Active => return Ok(()),
            WatchState::Closed => {
                return Err(VfsError::WatchUnavailable(
                    "watch manager is closed".to_string(),
                ))
            }
            WatchState::Unstarted => {}
        }

        let (tx, rx) = flume::unbounded();
        let native_tx = tx.clone();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = native_tx.send(LoopMsg::Native(res));
        })
        .map_err(|e| VfsError::Watch(format!("failed to create watcher: {}", e)))?;

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("vfs-watch".to_string())
            .spawn(move || {
                let logger = shared.logger.clone();
                logger.scope(|| shared.run(rx));
            })
            .map_err(|e| VfsError::from_io(e, "spawn watch loop"))?;

        control.watcher = Some(watcher);
        control.shutdown = Some(tx);
        control.event_loop = Some(handle);
        control.state = WatchState::Active;

        self.shared.logger.scope(|| {
            info!(root = %self.shared.root.display(), "watch manager started");
        });
        Ok(())
    }

    pub fn state(&self) -> WatchState {
        self.control.lock().state
    }

    /// Register `callback` for events matching `pattern`
    ///
    /// `pattern` is a cleaned logical path. Registering the same pattern
    /// again replaces its callback.
    pub fn watch(&self, pattern: &str, callback: WatchCallback) -> VfsResult<()> {
        let parsed = WatchPattern::parse(pattern)?;
        let mut control = self.control.lock();
        if control.state != WatchState::Active {
            return Err(unavailable(control.state));
        }

        let mut watches = self.shared.watches.write();
        if let Some(existing) = watches.get_mut(pattern) {
            existing.callback = callback;
            return Ok(());
        }

        let native = self.shared.disk_path(&parsed.native_target());
        control.acquire(&native, pattern)?;
        watches.insert(
            pattern.to_string(),
            Registration {
                pattern: parsed,
                callback,
                native,
            },
        );
        drop(watches);

        self.shared
            .logger
            .scope(|| debug!(pattern, "started watching"));
        Ok(())
    }

    /// Remove one registration; unknown patterns and inactive managers are
    /// a no-op
    pub fn stop_watch(&self, pattern: &str) -> VfsResult<()> {
        let mut control = self.control.lock();
        if control.state != WatchState::Active {
            return Ok(());
        }

        let removed = self.shared.watches.write().remove(pattern);
        if let Some(registration) = removed {
            self.shared.logger.scope(|| {
                control.release(&registration.native);
                debug!(pattern, "stopped watching");
            });
        }
        Ok(())
    }

    pub fn stop_all_watches(&self) -> VfsResult<()> {
        let mut control = self.control.lock();
        if control.state != WatchState::Active {
            return Ok(());
        }
        self.clear_registrations(&mut control);
        Ok(())
    }

    pub fn is_watching(&self, pattern: &str) -> bool {
        let control = self.control.lock();
        control.state == WatchState::Active && self.shared.watches.read().contains_key(pattern)
    }

    /// Receiver for every translated event, regardless of pattern
    pub fn subscribe(&self) -> VfsResult<broadcast::Receiver<WatchEvent>> {
        let control = self.control.lock();
        if control.state == WatchState::Closed {
            return Err(unavailable(control.state));
        }
        Ok(self.shared.events.subscribe())
    }

    /// Stop all watches, release the native watcher and end the event loop
    ///
    /// Idempotent; a never-started manager goes straight to `Closed`.
    pub fn close(&self) -> VfsResult<()> {
        let (watcher, shutdown, event_loop) = {
            let mut control = self.control.lock();
            if control.state == WatchState::Closed {
                return Ok(());
            }
            if control.state == WatchState::Active {
                self.clear_registrations(&mut control);
            }
            control.state = WatchState::Closed;
            (
                control.watcher.take(),
                control.shutdown.take(),
                control.event_loop.take(),
            )
        };

        if let Some(tx) = shutdown {
            let _ = tx.send(LoopMsg::Shutdown);
        }
        drop(watcher);

        if let Some(handle) = event_loop {
            // The loop thread cannot join itself
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                self.shared
                    .logger
                    .scope(|| error!("watch loop terminated with a panic"));
            }
        }

        self.shared
            .logger
            .scope(|| info!(root = %self.shared.root.display(), "watch manager closed"));
        Ok(())
    }

    fn clear_registrations(&self, control: &mut Control) {
        let drained: Vec<(String, Registration)> = self.shared.watches.write().drain().collect();
        self.shared.logger.scope(|| {
            for (_, registration) in &drained {
                control.release(&registration.native);
            }
            debug!(count = drained.len(), "stopped all watches");
        });
    }
}

impl Drop for WatchManager {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl fmt::Debug for WatchManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchManager")
            .field("root", &self.shared.root)
            .field("state", &self.state())
            .field("watches", &self.shared.watches.read().len())
            .finish()
    }
}

impl Control {
    fn acquire(&mut self, native: &Path, pattern: &str) -> VfsResult<()> {
        if let Some(count) = self.native_refs.get_mut(native) {
            *count += 1;
            return Ok(());
        }
        let watcher = self
            .watcher
            .as_mut()
            .ok_or_else(|| VfsError::WatchUnavailable("native watcher released".to_string()))?;
        watcher
            .watch(native, RecursiveMode::NonRecursive)
            .map_err(|e| native_error(e, pattern))?;
        self.native_refs.insert(native.to_path_buf(), 1);
        Ok(())
    }

    fn release(&mut self, native: &Path) {
        let Some(count) = self.native_refs.get_mut(native) else {
            return;
        };
        *count -= 1;
        if *count > 0 {
            return;
        }
        self.native_refs.remove(native);
        if let Some(watcher) = self.watcher.as_mut() {
            if let Err(e) = watcher.unwatch(native) {
                warn!(path = %native.display(), error = %e, "failed to remove native watch");
            }
        }
    }
}

impl Shared {
    fn run(&self, rx: flume::Receiver<LoopMsg>) {
        debug!("watch loop running");
        while let Ok(msg) = rx.recv() {
            match msg {
                LoopMsg::Native(Ok(event)) => self.handle_event(event),
                LoopMsg::Native(Err(err)) => self.broadcast_error(err),
                LoopMsg::Shutdown => break,
            }
        }
        debug!("watch loop exited");
    }

    fn handle_event(&self, event: notify::Event) {
        let Some(op) = op_from_kind(&event.kind) else {
            return;
        };

        for host_path in &event.paths {
            let Some(logical) = self.to_logical(host_path) else {
                warn!(path = %host_path.display(), "event outside watch root");
                continue;
            };
            let translated = WatchEvent::new(logical, op, detect_is_dir(host_path, &event.kind));
            debug!(op = %translated.op, path = %translated.path, "file event");

            self.events.emit(translated.clone());

            let targets: Vec<WatchCallback> = {
                let watches = self.watches.read();
                watches
                    .values()
                    .filter(|r| r.pattern.matches(&translated.path))
                    .map(|r| Arc::clone(&r.callback))
                    .collect()
            };
            for callback in targets {
                self.dispatch(callback, translated.clone());
            }
        }
    }

    /// Native failures reach every registration, addressed by its pattern
    fn broadcast_error(&self, err: notify::Error) {
        let message = err.to_string();
        error!(error = %message, "file watcher error");

        self.events
            .emit(WatchEvent::failure("/", VfsError::Watch(message.clone())));

        let targets: Vec<(String, WatchCallback)> = {
            let watches = self.watches.read();
            watches
                .iter()
                .map(|(pattern, r)| (pattern.clone(), Arc::clone(&r.callback)))
                .collect()
        };
        for (pattern, callback) in targets {
            self.dispatch(
                callback,
                WatchEvent::failure(pattern, VfsError::Watch(message.clone())),
            );
        }
    }

    /// Run one callback on its own thread; a panic is logged and contained
    fn dispatch(&self, callback: WatchCallback, event: WatchEvent) {
        let logger = self.logger.clone();
        let spawned = thread::Builder::new()
            .name("vfs-watch-callback".to_string())
            .spawn(move || {
                logger.scope(|| {
                    let path = event.path.clone();
                    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                        error!(path = %path, panic = %panic_message(&*panic), "watch callback panicked");
                    }
                })
            });
        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn watch callback");
        }
    }

    fn disk_path(&self, logical: &str) -> PathBuf {
        let rel = logical.trim_start_matches('/');
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    /// Host path → slash-rooted logical path
    fn to_logical(&self, host_path: &Path) -> Option<String> {
        let rel = host_path
            .strip_prefix(&self.root)
            .or_else(|_| host_path.strip_prefix(&self.canonical_root))
            .ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(format!("/{}", parts.join("/")))
    }
}

fn unavailable(state: WatchState) -> VfsError {
    let reason = match state {
        WatchState::Closed => "watch manager is closed",
        _ => "watch manager is not running",
    };
    VfsError::WatchUnavailable(reason.to_string())
}

fn native_error(err: notify::Error, pattern: &str) -> VfsError {
    let context = format!("watch {}", pattern);
    match err.kind {
        notify::ErrorKind::Io(io) => VfsError::from_io(io, context),
        notify::ErrorKind::PathNotFound => VfsError::NotFound(context),
        other => VfsError::Watch(format!("{}: {:?}", context, other)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
