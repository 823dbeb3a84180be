/*!
 * VFS Configuration
 * Construction options and the per-instance log sink
 */

use std::fmt;
use std::path::PathBuf;
use tracing::Dispatch;

/// Default buffer size for async event subscribers
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Where an instance sends its Debug/Info/Error messages
///
/// Wraps a `tracing` dispatcher. The default discards everything; use
/// [`Logger::global`] to forward to the process-wide subscriber.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Sink that drops every message
    pub fn discard() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Forward to the subscriber that is current at call time
    pub fn global() -> Self {
        Self {
            dispatch: tracing::dispatcher::get_default(|d| d.clone()),
        }
    }

    /// Forward to a specific dispatcher (e.g. a test subscriber)
    pub fn from_dispatch(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Run `f` with this sink installed as the thread's default subscriber
    pub(crate) fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::discard()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

/// Options accepted by every constructor
#[derive(Debug, Clone)]
pub struct VfsOptions {
    pub logger: Logger,
    /// Root override for disk instances
    pub root: Option<PathBuf>,
    /// Buffer size of the broadcast channel behind `Vfs::subscribe`
    pub event_capacity: usize,
}

impl VfsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from the environment
    ///
    /// - `VFS_ROOT`: root override for disk mode
    /// - `VFS_EVENT_CAPACITY`: subscriber buffer size
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(root) = std::env::var("VFS_ROOT") {
            if !root.is_empty() {
                opts.root = Some(PathBuf::from(root));
            }
        }
        if let Some(capacity) = std::env::var("VFS_EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&c| c > 0)
        {
            opts.event_capacity = capacity;
        }
        opts
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl Default for VfsOptions {
    fn default() -> Self {
        Self {
            logger: Logger::discard(),
            root: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
