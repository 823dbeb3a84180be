/*!
 * Trait Implementations
 * FileSystem and Archive capability sets for MemFS
 */

use std::path::Path;

use super::super::traits::{Archive, FileSystem};
use super::super::types::*;
use super::node::Node;
use super::MemFS;

impl FileSystem for MemFS {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.read_impl(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        self.write_impl(path, data)
    }

    fn delete(&self, path: &Path) -> VfsResult<()> {
        self.delete_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize(path);
        self.nodes.contains_key(&path)
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        let path = self.normalize(path);

        self.nodes
            .get(&path)
            .map(|node| node.metadata())
            .ok_or_else(|| VfsError::NotFound(path.display().to_string()))
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        self.list_dir_impl(path)
    }

    fn create_dir(&self, path: &Path) -> VfsResult<()> {
        self.create_dir_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> VfsResult<()> {
        self.remove_dir_all_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.rename_impl(from, to)
    }

    fn set_permissions(&self, path: &Path, perms: Permissions) -> VfsResult<()> {
        let path = self.normalize(path);

        match self.nodes.get_mut(&path) {
            Some(mut entry) => {
                match entry.value_mut() {
                    Node::File { permissions, .. } | Node::Directory { permissions, .. } => {
                        *permissions = perms;
                    }
                }
                Ok(())
            }
            None => Err(VfsError::NotFound(path.display().to_string())),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// A memory tree can be registered as a bundled namespace; archive paths
/// are rooted at `/`.
impl Archive for MemFS {
    fn read(&self, path: &str) -> VfsResult<Vec<u8>> {
        self.read_impl(Path::new(path))
    }

    fn metadata(&self, path: &str) -> VfsResult<Metadata> {
        FileSystem::metadata(self, Path::new(path))
    }

    fn list_dir(&self, path: &str) -> VfsResult<Vec<Entry>> {
        self.list_dir_impl(Path::new(path))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
