/*!
 * Directory Operations Implementation
 * Listing, recursive creation and removal, rename
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::super::types::*;
use super::node::Node;
use super::MemFS;

impl MemFS {
    pub(super) fn list_dir_impl(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let path = self.normalize(path);

        let children = match self.nodes.get(&path).as_deref() {
            Some(Node::Directory { children, .. }) => children.clone(),
            Some(Node::File { .. }) => {
                return Err(VfsError::NotADirectory(path.display().to_string()))
            }
            None => return Err(VfsError::NotFound(path.display().to_string())),
        };

        let mut entries = Vec::with_capacity(children.len());
        for (name, child_path) in children {
            if let Some(node) = self.nodes.get(&child_path) {
                entries.push(Entry::new(name, node.file_type()));
            }
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    pub(super) fn create_dir_impl(&self, path: &Path) -> VfsResult<()> {
        let path = self.normalize(path);

        let mut current = PathBuf::from("/");
        for component in path.components().skip(1) {
            current.push(component);

            let existing_is_dir = self.nodes.get(&current).map(|n| n.is_dir());
            match existing_is_dir {
                Some(true) => continue,
                Some(false) => return Err(VfsError::NotADirectory(current.display().to_string())),
                None => {}
            }

            let parent = current
                .parent()
                .ok_or_else(|| VfsError::InvalidPath("path has no parent".to_string()))?
                .to_path_buf();
            let name = self.file_name(&current)?;

            self.nodes.insert(
                current.clone(),
                Node::Directory {
                    children: HashMap::default(),
                    permissions: Permissions::executable(),
                    created: SystemTime::now(),
                },
            );
            self.add_child(&parent, &name, &current)?;
        }

        Ok(())
    }

    pub(super) fn remove_dir_all_impl(&self, path: &Path) -> VfsResult<()> {
        let path = self.normalize(path);
        if !self.nodes.contains_key(&path) {
            return Ok(());
        }

        // Collect the subtree first; removal happens children-first
        let mut to_remove = Vec::new();
        let mut to_visit = vec![path.clone()];
        while let Some(current) = to_visit.pop() {
            if let Some(Node::Directory { children, .. }) = self.nodes.get(&current).as_deref() {
                to_visit.extend(children.values().cloned());
            }
            to_remove.push(current);
        }

        let is_root = path == Path::new("/");
        for path_to_remove in to_remove.into_iter().rev() {
            if is_root && path_to_remove == Path::new("/") {
                continue;
            }
            self.nodes.remove(&path_to_remove);
        }

        if is_root {
            if let Some(mut root) = self.nodes.get_mut(Path::new("/")) {
                if let Node::Directory { children, .. } = root.value_mut() {
                    children.clear();
                }
            }
        } else if let Some(parent) = self.parent_path(&path) {
            let name = self.file_name(&path)?;
            self.remove_child(&parent, &name)?;
        }
        Ok(())
    }

    pub(super) fn rename_impl(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from = self.normalize(from);
        let to = self.normalize(to);
        if from == to {
            return Ok(());
        }
        if to.starts_with(&from) {
            return Err(VfsError::InvalidArgument(format!(
                "cannot move {} into itself",
                from.display()
            )));
        }
        self.ensure_parent(&to)?;
        if !self.nodes.contains_key(&from) {
            return Err(VfsError::NotFound(from.display().to_string()));
        }

        // Re-key the whole subtree under the new prefix
        let mut moved = Vec::new();
        let mut to_visit = vec![from.clone()];
        while let Some(current) = to_visit.pop() {
            if let Some((_, node)) = self.nodes.remove(&current) {
                if let Node::Directory { children, .. } = &node {
                    to_visit.extend(children.values().cloned());
                }
                moved.push((current, node));
            }
        }

        for (old_path, mut node) in moved {
            let suffix = old_path.strip_prefix(&from).unwrap_or(Path::new(""));
            let new_path = if suffix.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(suffix)
            };
            if let Node::Directory { children, .. } = &mut node {
                for child in children.values_mut() {
                    let rel = child.strip_prefix(&old_path).unwrap_or(Path::new(""));
                    *child = new_path.join(rel);
                }
            }
            self.nodes.insert(new_path, node);
        }

        if let Some(from_parent) = self.parent_path(&from) {
            let from_name = self.file_name(&from)?;
            self.remove_child(&from_parent, &from_name)?;
        }
        if let Some(to_parent) = self.parent_path(&to) {
            let to_name = self.file_name(&to)?;
            self.add_child(&to_parent, &to_name, &to)?;
        }
        Ok(())
    }
}
