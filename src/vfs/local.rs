/*!
 * Local Filesystem Backend
 * Disk store bound to a root directory
 */

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use super::traits::FileSystem;
use super::types::*;

/// Local filesystem implementation using std::fs
///
/// Every path is interpreted relative to `root`; `..` can never climb
/// above it.
#[derive(Debug, Clone)]
pub struct LocalFS {
    root: PathBuf,
}

impl LocalFS {
    /// Create new local filesystem rooted at specified path
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a store path to a host path under root
    ///
    /// Components are processed manually so the result is correct for
    /// paths that do not exist yet.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let mut components = Vec::with_capacity(8);

        for component in path.components() {
            match component {
                Component::Normal(name) => components.push(name),
                Component::ParentDir => {
                    // At the root boundary `..` is dropped
                    components.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        let mut result = self.root.clone();
        for component in components {
            result.push(component);
        }
        result
    }

    fn convert_metadata(md: fs::Metadata) -> Metadata {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            md.permissions().mode()
        };
        #[cfg(not(unix))]
        let mode = if md.permissions().readonly() {
            0o444
        } else {
            0o644
        };

        Metadata {
            file_type: FileType::from(md.file_type()),
            size: md.len(),
            permissions: Permissions::new(mode),
            modified: md.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            created: md.created().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }
}

/// Apply mode bits to a host path
pub(crate) fn set_host_permissions(path: &Path, perms: Permissions) -> VfsResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(perms.mode))
            .map_err(|e| VfsError::from_io(e, format!("set_permissions {}", path.display())))
    }

    #[cfg(not(unix))]
    {
        let mut host_perms = fs::metadata(path)
            .map_err(|e| VfsError::from_io(e, format!("metadata {}", path.display())))?
            .permissions();
        host_perms.set_readonly(perms.is_readonly());
        fs::set_permissions(path, host_perms)
            .map_err(|e| VfsError::from_io(e, format!("set_permissions {}", path.display())))
    }
}

/// Read mode bits from a host path
pub(crate) fn host_metadata(path: &Path) -> VfsResult<Metadata> {
    let md = fs::metadata(path)
        .map_err(|e| VfsError::from_io(e, format!("metadata {}", path.display())))?;
    Ok(LocalFS::convert_metadata(md))
}

impl FileSystem for LocalFS {
    fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full_path = self.resolve(path);
        fs::read(&full_path).map_err(|e| VfsError::from_io(e, format!("read {}", path.display())))
    }

    fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let full_path = self.resolve(path);
        fs::write(&full_path, data)
            .map_err(|e| VfsError::from_io(e, format!("write {}", path.display())))
    }

    fn delete(&self, path: &Path) -> VfsResult<()> {
        let full_path = self.resolve(path);
        let md = fs::symlink_metadata(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("delete {}", path.display())))?;
        let result = if md.is_dir() {
            fs::remove_dir(&full_path)
        } else {
            fs::remove_file(&full_path)
        };
        result.map_err(|e| VfsError::from_io(e, format!("delete {}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn metadata(&self, path: &Path) -> VfsResult<Metadata> {
        let full_path = self.resolve(path);
        let md = fs::metadata(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("metadata {}", path.display())))?;
        Ok(Self::convert_metadata(md))
    }

    fn list_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let full_path = self.resolve(path);
        let entries = fs::read_dir(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("list_dir {}", path.display())))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| VfsError::from_io(e, format!("read dir entry in {}", path.display())))?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| VfsError::InvalidPath("invalid UTF-8 in filename".to_string()))?;
            let file_type = entry
                .file_type()
                .map_err(|e| VfsError::from_io(e, format!("get file type for {}", name)))?;

            result.push(Entry::new(name, FileType::from(file_type)));
        }

        sort_entries(&mut result);
        Ok(result)
    }

    fn create_dir(&self, path: &Path) -> VfsResult<()> {
        let full_path = self.resolve(path);
        fs::create_dir_all(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("create_dir {}", path.display())))
    }

    fn remove_dir_all(&self, path: &Path) -> VfsResult<()> {
        let full_path = self.resolve(path);
        let md = match fs::symlink_metadata(&full_path) {
            Ok(md) => md,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(VfsError::from_io(e, format!("remove_all {}", path.display()))),
        };

        if full_path == self.root {
            // Empty the root but keep it, so the store stays usable
            for entry in self.list_dir(Path::new("/"))? {
                self.remove_dir_all(&Path::new("/").join(&entry.name))?;
            }
            return Ok(());
        }

        let result = if md.is_dir() {
            fs::remove_dir_all(&full_path)
        } else {
            fs::remove_file(&full_path)
        };
        result.map_err(|e| VfsError::from_io(e, format!("remove_all {}", path.display())))
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from_full = self.resolve(from);
        let to_full = self.resolve(to);

        fs::rename(&from_full, &to_full).map_err(|e| {
            VfsError::from_io(e, format!("rename {} to {}", from.display(), to.display()))
        })
    }

    fn set_permissions(&self, path: &Path, perms: Permissions) -> VfsResult<()> {
        set_host_permissions(&self.resolve(path), perms)
    }

    fn name(&self) -> &str {
        "local"
    }
}
