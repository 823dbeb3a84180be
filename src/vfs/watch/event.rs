/*!
 * Watch Events
 * Backend-agnostic change events and translation from native kinds
 */

use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::super::types::VfsError;

/// Kind of change observed on a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchOp {
    Create,
    Write,
    Remove,
    Rename,
    AttributeChange,
}

impl fmt::Display for WatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchOp::Create => "CREATE",
            WatchOp::Write => "WRITE",
            WatchOp::Remove => "REMOVE",
            WatchOp::Rename => "RENAME",
            WatchOp::AttributeChange => "CHMOD",
        };
        write!(f, "{}", s)
    }
}

/// One translated change, or a watcher-level failure when `error` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEvent {
    /// Logical path of the changed entry; for failures, the watch pattern
    pub path: String,
    pub op: WatchOp,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<VfsError>,
}

impl WatchEvent {
    pub fn new(path: impl Into<String>, op: WatchOp, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            op,
            is_dir,
            error: None,
        }
    }

    /// Error-carrying event addressed to the registration for `pattern`
    pub fn failure(pattern: impl Into<String>, error: VfsError) -> Self {
        Self {
            path: pattern.into(),
            op: WatchOp::Write,
            is_dir: false,
            error: Some(error),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Map a native event kind; access notifications are not changes
pub(crate) fn op_from_kind(kind: &EventKind) -> Option<WatchOp> {
    match kind {
        EventKind::Access(_) => None,
        EventKind::Create(_) => Some(WatchOp::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(WatchOp::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(WatchOp::AttributeChange),
        EventKind::Modify(_) => Some(WatchOp::Write),
        EventKind::Remove(_) => Some(WatchOp::Remove),
        EventKind::Any | EventKind::Other => Some(WatchOp::Write),
    }
}

/// Directory flag carried by the native kind, when the backend reports it
fn kind_is_dir(kind: &EventKind) -> Option<bool> {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => Some(true),
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => Some(false),
        _ => None,
    }
}

/// Decide whether a host path is a directory
///
/// Stat wins while the path exists. Removed paths fall back to the native
/// kind, then to "no extension means directory".
pub(crate) fn detect_is_dir(host_path: &Path, kind: &EventKind) -> bool {
    if let Ok(md) = std::fs::metadata(host_path) {
        return md.is_dir();
    }
    kind_is_dir(kind).unwrap_or_else(|| host_path.extension().is_none())
}
