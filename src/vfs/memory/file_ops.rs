/*!
 * File Operations Implementation
 * Byte-level reads and writes on the node map
 */

use std::path::Path;
use std::time::SystemTime;

use super::super::types::*;
use super::node::Node;
use super::MemFS;

impl MemFS {
    pub(super) fn read_impl(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let path = self.normalize(path);

        match self.nodes.get(&path).as_deref() {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(VfsError::IsADirectory(path.display().to_string())),
            None => Err(VfsError::NotFound(path.display().to_string())),
        }
    }

    pub(super) fn write_impl(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let path = self.normalize(path);
        self.ensure_parent(&path)?;

        let now = SystemTime::now();

        // Overwrites keep the existing mode and creation time; mode bits are
        // recorded, not enforced
        let existing = match self.nodes.get(&path).as_deref() {
            Some(Node::File {
                permissions,
                created,
                ..
            }) => Some((*permissions, *created)),
            Some(Node::Directory { .. }) => {
                return Err(VfsError::IsADirectory(path.display().to_string()))
            }
            None => None,
        };

        let (permissions, created) = match existing {
            Some(kept) => kept,
            None => {
                if let Some(parent) = self.parent_path(&path) {
                    let file_name = self.file_name(&path)?;
                    self.add_child(&parent, &file_name, &path)?;
                }
                (Permissions::readwrite(), now)
            }
        };

        self.nodes.insert(
            path,
            Node::File {
                data: data.to_vec(),
                permissions,
                modified: now,
                created,
            },
        );

        Ok(())
    }

    pub(super) fn delete_impl(&self, path: &Path) -> VfsResult<()> {
        let path = self.normalize(path);

        let is_dir = match self.nodes.get(&path).as_deref() {
            Some(Node::Directory { children, .. }) => {
                if !children.is_empty() {
                    return Err(VfsError::InvalidArgument(format!(
                        "directory not empty: {}",
                        path.display()
                    )));
                }
                true
            }
            Some(Node::File { .. }) => false,
            None => return Err(VfsError::NotFound(path.display().to_string())),
        };

        if is_dir && path == Path::new("/") {
            return Err(VfsError::InvalidArgument("cannot remove root".to_string()));
        }

        self.nodes.remove(&path);
        if let Some(parent) = self.parent_path(&path) {
            let name = self.file_name(&path)?;
            self.remove_child(&parent, &name)?;
        }
        Ok(())
    }
}
