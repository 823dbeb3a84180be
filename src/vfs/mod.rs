/*!
 * Virtual File System Module
 * Memory, disk and bundled stores behind one logical path space
 */

pub mod bundled;
pub mod config;
mod dump;
pub mod embedded;
pub mod local;
pub mod memory;
pub mod paths;
pub mod traits;
mod transfer;
pub mod types;
pub mod unified;
pub mod watch;

// Re-exports
pub use bundled::{BundledFs, BundledRegistry};
pub use config::{Logger, VfsOptions, DEFAULT_EVENT_CAPACITY};
pub use embedded::EmbeddedDir;
pub use local::LocalFS;
pub use memory::MemFS;
pub use traits::{Archive, FileSystem};
pub use types::{Entry, FileType, Metadata, Permissions, VfsError, VfsResult};
pub use unified::{Vfs, VfsKind};
pub use watch::{WatchCallback, WatchEvent, WatchManager, WatchOp, WatchPattern, WatchState};
