/*!
 * Unified VFS Library
 * Memory, disk and bundled filesystems behind a single path space
 */

pub mod monitoring;
pub mod vfs;

// Re-exports
pub use monitoring::init_tracing;
pub use vfs::{
    Archive, EmbeddedDir, FileSystem, Logger, Metadata, Permissions, Vfs, VfsError, VfsKind,
    VfsOptions, VfsResult, WatchEvent, WatchOp,
};
