/*!
 * Transfers
 * Copy, move, clone, merge and host import/export for the facade
 *
 * None of these are transactional: the first failing step aborts the
 * rest and already-completed steps stay in place.
 */

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::local::{host_metadata, set_host_permissions};
use super::paths::{self, ROOT};
use super::types::*;
use super::unified::{Vfs, VfsKind};
use crate::monitoring::{span_operation, OperationSpan};

impl Vfs {
    /// Copy one file, keeping its mode bits
    pub fn copy(&self, src: &str, dst: &str) -> VfsResult<()> {
        let data = self.read_file(src)?;
        let metadata = self.stat(src)?;
        self.write_file(dst, &data, metadata.permissions)
    }

    /// Copy then remove the source
    ///
    /// A failed remove leaves both copies; use [`Vfs::rename`] when the
    /// move has to be atomic.
    pub fn move_file(&self, src: &str, dst: &str) -> VfsResult<()> {
        self.copy(src, dst)?;
        self.remove(src)
    }

    /// Independent memory-backed copy of the mutable tree
    ///
    /// The bundled registry is shared with the original, not duplicated.
    pub fn try_clone(&self) -> VfsResult<Vfs> {
        self.traced("clone", |span| self.clone_into_memory(span))
    }

    fn clone_into_memory(&self, span: &OperationSpan) -> VfsResult<Vfs> {
        let clone = Vfs::ephemeral(
            VfsKind::Memory,
            self.logger().clone(),
            Arc::clone(self.registry()),
        );

        // Directory modes are applied after their contents, deepest first
        let mut dir_modes = Vec::new();
        let mut files = 0usize;
        self.walk(ROOT, |path, metadata| {
            if self.is_bundled(path) {
                return Ok(());
            }
            if metadata.is_dir() {
                if path != ROOT {
                    clone.store().create_dir(Path::new(path))?;
                    dir_modes.push((path.to_string(), metadata.permissions));
                }
                return Ok(());
            }
            let data = self.read_file(path)?;
            files += 1;
            clone.write_file(path, &data, metadata.permissions)
        })?;

        for (path, perms) in dir_modes.iter().rev() {
            clone.store().set_permissions(Path::new(path), *perms)?;
        }

        span.record_items_processed(files);
        debug!(files, kind = %self.kind(), "cloned filesystem");
        Ok(clone)
    }

    /// Copy every file of `other` under `dest`; existing files are
    /// overwritten in walk order
    pub fn merge(&self, other: &Vfs, dest: &str) -> VfsResult<()> {
        self.ensure_mutable(dest, "merge")?;
        let dest = self.normalize(dest);

        self.traced("merge", |span| {
            let mut files = 0usize;
            other.walk(ROOT, |path, metadata| {
                if metadata.is_dir() {
                    return Ok(());
                }
                let data = other.read_file(path)?;
                files += 1;
                self.write_file(&paths::join(&dest, path), &data, metadata.permissions)
            })?;

            span.record_items_processed(files);
            debug!(dest = %dest, files, "merged filesystem");
            Ok(())
        })
    }

    /// Import a host file or directory tree into the mutable store at `dest`
    pub fn load_from_disk<P: AsRef<Path>>(&self, src: P, dest: &str) -> VfsResult<()> {
        self.ensure_mutable(dest, "load_from_disk")?;
        let src = src.as_ref();
        let dest = self.normalize(dest);

        self.traced("load_from_disk", |_| {
            let metadata = fs::metadata(src)
                .map_err(|e| VfsError::from_io(e, format!("load {}", src.display())))?;
            if metadata.is_dir() {
                self.load_dir(src, &dest)?;
            } else {
                self.load_file(src, &dest)?;
            }

            info!(src = %src.display(), dest = %dest, "loaded from disk");
            Ok(())
        })
    }

    fn load_dir(&self, host_dir: &Path, dest: &str) -> VfsResult<()> {
        self.store().create_dir(Path::new(dest))?;

        let mut entries = fs::read_dir(host_dir)
            .map_err(|e| VfsError::from_io(e, format!("read_dir {}", host_dir.display())))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| VfsError::from_io(e, format!("read_dir {}", host_dir.display())))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| VfsError::InvalidPath("invalid UTF-8 in filename".to_string()))?;
            let host_path = entry.path();
            let target = paths::join(dest, &name);

            if fs::metadata(&host_path)
                .map_err(|e| VfsError::from_io(e, format!("stat {}", host_path.display())))?
                .is_dir()
            {
                self.load_dir(&host_path, &target)?;
            } else {
                self.load_file(&host_path, &target)?;
            }
        }
        Ok(())
    }

    fn load_file(&self, host_path: &Path, dest: &str) -> VfsResult<()> {
        let data = fs::read(host_path)
            .map_err(|e| VfsError::from_io(e, format!("read {}", host_path.display())))?;
        let perms = host_metadata(host_path)?.permissions;
        self.write_file(dest, &data, perms)
    }

    /// Export the mutable subtree at `src` to a host directory
    ///
    /// Bundled paths are refused; a single file is written to `dest` itself.
    pub fn save_to_disk<P: AsRef<Path>>(&self, src: &str, dest: P) -> VfsResult<()> {
        if self.is_bundled(src) {
            return Err(VfsError::InvalidArgument(format!(
                "cannot save bundled path to disk: {}",
                src
            )));
        }
        let dest = dest.as_ref();
        let src_root = self.normalize(src);

        self.traced("save_to_disk", |span| {
            let mut files = 0usize;
            self.walk(&src_root, |path, metadata| {
                let rel = paths::relative_to(path, &src_root).unwrap_or("");
                let host_path = if rel.is_empty() {
                    dest.to_path_buf()
                } else {
                    dest.join(rel)
                };

                if metadata.is_dir() {
                    return fs::create_dir_all(&host_path)
                        .map_err(|e| VfsError::from_io(e, format!("mkdir {}", host_path.display())));
                }

                if let Some(parent) = host_path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| VfsError::from_io(e, format!("mkdir {}", parent.display())))?;
                }
                let data = self.read_file(path)?;
                fs::write(&host_path, data)
                    .map_err(|e| VfsError::from_io(e, format!("write {}", host_path.display())))?;
                files += 1;
                set_host_permissions(&host_path, metadata.permissions)
            })?;

            span.record_items_processed(files);
            info!(src = %src_root, dest = %dest.display(), files, "saved to disk");
            Ok(())
        })
    }

    /// Run a bulk operation inside this instance's log sink and a timed span
    fn traced<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&OperationSpan) -> VfsResult<T>,
    ) -> VfsResult<T> {
        self.logger().scope(|| {
            let span = span_operation(operation);
            let _entered = span.enter();
            let result = f(&span);
            match &result {
                Ok(_) => span.record_result(true),
                Err(e) => span.record_error(&e.to_string()),
            }
            result
        })
    }
}
