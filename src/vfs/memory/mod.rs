/*!
 * In-Memory Filesystem Backend
 * Ephemeral store used by memory and hybrid instances and by clones
 */

mod dir_ops;
mod file_ops;
mod metadata_ops;
mod node;

use ahash::RandomState;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::types::*;
use node::Node;

/// In-memory filesystem implementation
///
/// Nodes are keyed by normalized absolute path. Cloning the handle shares
/// the same tree; use a fresh `MemFS` for an independent copy.
#[derive(Debug, Clone)]
pub struct MemFS {
    pub(super) nodes: Arc<DashMap<PathBuf, Node, RandomState>>,
}

impl MemFS {
    /// Create new in-memory filesystem
    pub fn new() -> Self {
        let nodes = DashMap::with_hasher(RandomState::new());

        nodes.insert(
            PathBuf::from("/"),
            Node::Directory {
                children: HashMap::default(),
                permissions: Permissions::executable(),
                created: SystemTime::now(),
            },
        );

        Self {
            nodes: Arc::new(nodes),
        }
    }

    /// Normalize path (make absolute and clean)
    pub(super) fn normalize(&self, path: &Path) -> PathBuf {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new("/").join(path)
        };

        path_clean::clean(&path)
    }

    pub(super) fn parent_path(&self, path: &Path) -> Option<PathBuf> {
        path.parent().map(|p| p.to_path_buf())
    }

    pub(super) fn file_name(&self, path: &Path) -> VfsResult<String> {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| VfsError::InvalidPath(format!("invalid path: {}", path.display())))
    }

    /// Ensure parent directory exists and is a directory
    pub(super) fn ensure_parent(&self, path: &Path) -> VfsResult<()> {
        if let Some(parent) = self.parent_path(path) {
            match self.nodes.get(&parent) {
                Some(node) if node.is_dir() => {}
                Some(_) => return Err(VfsError::NotADirectory(parent.display().to_string())),
                None => {
                    return Err(VfsError::NotFound(format!(
                        "parent directory not found: {}",
                        parent.display()
                    )))
                }
            }
        }
        Ok(())
    }

    pub(super) fn add_child(
        &self,
        parent_path: &Path,
        child_name: &str,
        child_path: &Path,
    ) -> VfsResult<()> {
        match self.nodes.get_mut(parent_path) {
            Some(mut node) => match node.value_mut() {
                Node::Directory { children, .. } => {
                    children.insert(child_name.to_string(), child_path.to_path_buf());
                    Ok(())
                }
                Node::File { .. } => Err(VfsError::NotADirectory(parent_path.display().to_string())),
            },
            None => Err(VfsError::NotFound(parent_path.display().to_string())),
        }
    }

    pub(super) fn remove_child(&self, parent_path: &Path, child_name: &str) -> VfsResult<()> {
        match self.nodes.get_mut(parent_path) {
            Some(mut node) => match node.value_mut() {
                Node::Directory { children, .. } => {
                    children.remove(child_name);
                    Ok(())
                }
                Node::File { .. } => Err(VfsError::NotADirectory(parent_path.display().to_string())),
            },
            None => Err(VfsError::NotFound(parent_path.display().to_string())),
        }
    }

    /// Number of files and directories, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for MemFS {
    fn default() -> Self {
        Self::new()
    }
}
