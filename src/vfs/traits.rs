/*!
 * VFS Traits
 * Capability sets for mutable backing stores and read-only archives
 */

use std::path::Path;

use super::types::*;

/// Mutable backing store
///
/// Implemented by the memory and disk stores. Paths are absolute,
/// slash-rooted and already normalized by the caller.
pub trait FileSystem: Send + Sync {
    /// Read entire file contents
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write entire file contents (create or overwrite); parent must exist
    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()>;

    /// Delete a file or an empty directory
    fn delete(&self, path: &Path) -> VfsResult<()>;

    /// Check if file/directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Get file metadata
    fn metadata(&self, path: &Path) -> VfsResult<Metadata>;

    /// List directory contents
    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>>;

    /// Create directory (including parents)
    fn create_dir(&self, path: &Path) -> VfsResult<()>;

    /// Remove directory recursively; missing paths are not an error
    fn remove_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Move/rename within the store
    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Set file permissions
    fn set_permissions(&self, path: &Path, perms: Permissions) -> VfsResult<()>;

    /// Get filesystem name/type
    fn name(&self) -> &str;
}

/// Read-only archive tree
///
/// Paths are relative to the archive root with no leading slash; the empty
/// string names the root itself.
pub trait Archive: Send + Sync {
    fn read(&self, path: &str) -> VfsResult<Vec<u8>>;

    fn metadata(&self, path: &str) -> VfsResult<Metadata>;

    fn list_dir(&self, path: &str) -> VfsResult<Vec<Entry>>;

    fn exists(&self, path: &str) -> bool {
        self.metadata(path).is_ok()
    }

    fn name(&self) -> &str;
}
