/*!
 * Embedded Archives
 * Read-only trees compiled into the binary with `include_dir!`
 */

use include_dir::Dir;

use super::paths::to_archive_path;
use super::traits::Archive;
use super::types::*;

/// Archive view over a compiled-in directory
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedDir {
    dir: &'static Dir<'static>,
}

impl EmbeddedDir {
    pub const fn new(dir: &'static Dir<'static>) -> Self {
        Self { dir }
    }

    fn find_dir(&self, path: &str) -> Option<&'static Dir<'static>> {
        if path.is_empty() {
            Some(self.dir)
        } else {
            self.dir.get_dir(path)
        }
    }
}

impl Archive for EmbeddedDir {
    fn read(&self, path: &str) -> VfsResult<Vec<u8>> {
        let path = to_archive_path(path);
        if let Some(file) = self.dir.get_file(&path) {
            return Ok(file.contents().to_vec());
        }
        if self.find_dir(&path).is_some() {
            return Err(VfsError::IsADirectory(display(&path)));
        }
        Err(VfsError::NotFound(display(&path)))
    }

    fn metadata(&self, path: &str) -> VfsResult<Metadata> {
        let path = to_archive_path(path);
        if let Some(file) = self.dir.get_file(&path) {
            return Ok(Metadata::archived_file(file.contents().len() as u64));
        }
        if self.find_dir(&path).is_some() {
            return Ok(Metadata::archived_dir());
        }
        Err(VfsError::NotFound(display(&path)))
    }

    fn list_dir(&self, path: &str) -> VfsResult<Vec<Entry>> {
        let path = to_archive_path(path);
        let Some(dir) = self.find_dir(&path) else {
            if self.dir.get_file(&path).is_some() {
                return Err(VfsError::NotADirectory(display(&path)));
            }
            return Err(VfsError::NotFound(display(&path)));
        };

        let mut entries: Vec<Entry> = dir
            .entries()
            .iter()
            .filter_map(|entry| {
                let name = entry.path().file_name()?.to_str()?.to_string();
                let file_type = if entry.as_dir().is_some() {
                    FileType::Directory
                } else {
                    FileType::File
                };
                Some(Entry::new(name, file_type))
            })
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn name(&self) -> &str {
        "embedded"
    }
}

fn display(path: &str) -> String {
    if path.is_empty() {
        "<archive root>".to_string()
    } else {
        path.to_string()
    }
}
