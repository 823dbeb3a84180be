/*!
 * VFS Metadata
 * Stat results shared by stores and archives
 */

use super::file_type::FileType;
use super::permissions::Permissions;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Metadata {
    pub file_type: FileType,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub permissions: Permissions,
    pub modified: SystemTime,
    pub created: SystemTime,
}

impl Metadata {
    /// Metadata for a read-only archive file; archives carry no timestamps
    pub fn archived_file(size: u64) -> Self {
        Self {
            file_type: FileType::File,
            size,
            permissions: Permissions::readonly(),
            modified: SystemTime::UNIX_EPOCH,
            created: SystemTime::UNIX_EPOCH,
        }
    }

    pub fn archived_dir() -> Self {
        Self {
            file_type: FileType::Directory,
            size: 0,
            permissions: Permissions::new(0o555),
            modified: SystemTime::UNIX_EPOCH,
            created: SystemTime::UNIX_EPOCH,
        }
    }

    /// Check if this is a directory
    #[inline(always)]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    /// Check if this is a regular file
    #[inline(always)]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }
}
