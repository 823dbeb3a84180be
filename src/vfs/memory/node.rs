/*!
 * Filesystem Node Types
 * Internal representation of files and directories
 */

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use super::super::types::{FileType, Metadata, Permissions};

/// In-memory filesystem node
#[derive(Debug, Clone)]
pub(in crate::vfs) enum Node {
    File {
        data: Vec<u8>,
        permissions: Permissions,
        modified: SystemTime,
        created: SystemTime,
    },
    Directory {
        children: HashMap<String, PathBuf>,
        permissions: Permissions,
        created: SystemTime,
    },
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Node::File { .. } => FileType::File,
            Node::Directory { .. } => FileType::Directory,
        }
    }

    pub fn metadata(&self) -> Metadata {
        match self {
            Node::File {
                data,
                permissions,
                modified,
                created,
            } => Metadata {
                file_type: FileType::File,
                size: data.len() as u64,
                permissions: *permissions,
                modified: *modified,
                created: *created,
            },
            Node::Directory {
                permissions,
                created,
                ..
            } => Metadata {
                file_type: FileType::Directory,
                size: 0,
                permissions: *permissions,
                modified: *created,
                created: *created,
            },
        }
    }
}
