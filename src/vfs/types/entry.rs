/*!
 * VFS Directory Entry
 */

use super::file_type::FileType;
use serde::{Deserialize, Serialize};

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub file_type: FileType,
}

impl Entry {
    /// Names come straight from a store listing and are not re-validated
    pub(crate) fn new(name: String, file_type: FileType) -> Self {
        Self { name, file_type }
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }
}

/// Sort entries by name so listings and walks are reproducible
pub(crate) fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
}
