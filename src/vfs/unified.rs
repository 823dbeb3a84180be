/*!
 * Unified Filesystem Facade
 * One call surface over the mutable store and the bundled namespaces
 */

use include_dir::Dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use super::bundled::BundledRegistry;
use super::config::{Logger, VfsOptions};
use super::embedded::EmbeddedDir;
use super::local::LocalFS;
use super::memory::MemFS;
use super::paths;
use super::traits::{Archive, FileSystem};
use super::types::*;
use super::watch::{WatchCallback, WatchEvent, WatchManager};

/// Which backing store an instance was built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VfsKind {
    Memory,
    Disk,
    Hybrid,
}

impl fmt::Display for VfsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsKind::Memory => write!(f, "memory"),
            VfsKind::Disk => write!(f, "disk"),
            VfsKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Unified virtual filesystem
///
/// Plain paths (`/a/b.txt`, or relative, which is rooted at `/`) address the
/// mutable store. `prefix://path` addresses a registered bundled archive and
/// is read-only. Disk instances also own a [`WatchManager`].
pub struct Vfs {
    kind: VfsKind,
    root: Option<PathBuf>,
    store: Arc<dyn FileSystem>,
    bundled: Arc<BundledRegistry>,
    watch: Option<WatchManager>,
    logger: Logger,
}

impl Vfs {
    /// Pure in-memory instance
    pub fn memory(opts: VfsOptions) -> Self {
        Self::ephemeral(VfsKind::Memory, opts.logger, Arc::new(BundledRegistry::new()))
    }

    /// In-memory store plus bundled archives
    pub fn hybrid(opts: VfsOptions) -> Self {
        Self::ephemeral(VfsKind::Hybrid, opts.logger, Arc::new(BundledRegistry::new()))
    }

    /// Disk instance rooted at `root` (or `opts.root` when set)
    ///
    /// The root directory is created if missing. Watching starts right
    /// away; if the native watcher cannot be created the instance still
    /// works and watch calls report `WatchUnavailable`.
    pub fn disk<P: Into<PathBuf>>(root: P, opts: VfsOptions) -> VfsResult<Self> {
        let root = opts.root.clone().unwrap_or_else(|| root.into());
        std::fs::create_dir_all(&root)
            .map_err(|e| VfsError::from_io(e, format!("create root {}", root.display())))?;

        let watch = WatchManager::new(&root, opts.logger.clone(), opts.event_capacity);
        if let Err(e) = watch.start() {
            opts.logger
                .scope(|| error!(error = %e, "failed to start file watcher"));
        }

        opts.logger
            .scope(|| info!(root = %root.display(), "disk filesystem ready"));

        Ok(Self {
            kind: VfsKind::Disk,
            store: Arc::new(LocalFS::new(&root)),
            root: Some(root),
            bundled: Arc::new(BundledRegistry::new()),
            watch: Some(watch),
            logger: opts.logger,
        })
    }

    /// Memory-backed instance over an existing registry
    pub(crate) fn ephemeral(kind: VfsKind, logger: Logger, bundled: Arc<BundledRegistry>) -> Self {
        Self {
            kind,
            root: None,
            store: Arc::new(MemFS::new()),
            bundled,
            watch: None,
            logger,
        }
    }

    pub fn kind(&self) -> VfsKind {
        self.kind
    }

    /// Disk root; `None` for memory-backed instances
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.logger
    }

    pub(crate) fn registry(&self) -> &Arc<BundledRegistry> {
        &self.bundled
    }

    pub(crate) fn store(&self) -> &dyn FileSystem {
        self.store.as_ref()
    }

    // ---- Bundled namespaces ----

    /// Make `archive` readable under `prefix://`, offset by `subdir`
    pub fn register_bundled(
        &self,
        prefix: &str,
        archive: Arc<dyn Archive>,
        subdir: &str,
    ) -> VfsResult<()> {
        let name = archive.name().to_string();
        self.bundled.register(prefix, archive, subdir)?;
        self.logger.scope(|| {
            info!(prefix, subdir, archive = %name, "registered bundled filesystem")
        });
        Ok(())
    }

    /// Register a directory compiled in with `include_dir!`
    pub fn register_embedded(
        &self,
        prefix: &str,
        dir: &'static Dir<'static>,
        subdir: &str,
    ) -> VfsResult<()> {
        self.register_bundled(prefix, Arc::new(EmbeddedDir::new(dir)), subdir)
    }

    /// Registered prefix names, alphabetical
    pub fn list_bundled(&self) -> Vec<String> {
        self.bundled.list()
    }

    pub fn is_bundled(&self, path: &str) -> bool {
        self.bundled.is_bundled(path)
    }

    /// Bundled paths are returned unchanged; anything else is made absolute
    /// and cleaned
    pub fn normalize(&self, path: &str) -> String {
        if self.bundled.is_bundled(path) {
            path.to_string()
        } else {
            paths::clean_absolute(path)
        }
    }

    pub(crate) fn ensure_mutable(&self, path: &str, action: &str) -> VfsResult<()> {
        if self.bundled.is_bundled(path) {
            self.logger
                .scope(|| error!(path, action, "refused mutation of bundled path"));
            return Err(VfsError::ReadOnlyPath(path.to_string()));
        }
        Ok(())
    }

    // ---- Reads ----

    pub fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        if let Some((bundled, rel)) = self.bundled.resolve(path) {
            return bundled.read_file(&rel);
        }
        let logical = self.normalize(path);
        self.store.read(Path::new(&logical)).map_err(|e| {
            self.logger
                .scope(|| error!(path = %logical, error = %e, "failed to read file"));
            e
        })
    }

    /// Read a file and require valid UTF-8
    pub fn read_to_string(&self, path: &str) -> VfsResult<String> {
        let data = self.read_file(path)?;
        String::from_utf8(data)
            .map_err(|e| VfsError::InvalidArgument(format!("{} is not valid UTF-8: {}", path, e)))
    }

    pub fn exists(&self, path: &str) -> bool {
        if let Some((bundled, rel)) = self.bundled.resolve(path) {
            return bundled.exists(&rel);
        }
        self.store.exists(Path::new(&self.normalize(path)))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.stat(path).map(|md| md.is_dir()).unwrap_or(false)
    }

    pub fn stat(&self, path: &str) -> VfsResult<Metadata> {
        if let Some((bundled, rel)) = self.bundled.resolve(path) {
            return bundled.stat(&rel);
        }
        self.store.metadata(Path::new(&self.normalize(path)))
    }

    /// Names of the regular files directly inside `dir`
    pub fn list_files(&self, dir: &str) -> VfsResult<Vec<String>> {
        if let Some((bundled, rel)) = self.bundled.resolve(dir) {
            return bundled.list_files(&rel);
        }
        Ok(self
            .store
            .list_dir(Path::new(&self.normalize(dir)))?
            .into_iter()
            .filter(|e| !e.is_dir())
            .map(|e| e.name)
            .collect())
    }

    /// Names of the directories directly inside `dir`
    pub fn list_dirs(&self, dir: &str) -> VfsResult<Vec<String>> {
        if let Some((bundled, rel)) = self.bundled.resolve(dir) {
            return bundled.list_dirs(&rel);
        }
        Ok(self
            .store
            .list_dir(Path::new(&self.normalize(dir)))?
            .into_iter()
            .filter(|e| e.is_dir())
            .map(|e| e.name)
            .collect())
    }

    /// Pre-order walk of `root`, children in name order
    ///
    /// The visitor gets the logical path of every entry, `root` included.
    /// Returning an error from the visitor stops the walk.
    pub fn walk<F>(&self, root: &str, mut visit: F) -> VfsResult<()>
    where
        F: FnMut(&str, &Metadata) -> VfsResult<()>,
    {
        if let Some((bundled, rel)) = self.bundled.resolve(root) {
            return bundled.walk(&rel, &mut visit);
        }
        let start = self.normalize(root);
        let metadata = self.store.metadata(Path::new(&start))?;
        self.walk_store(&start, &metadata, &mut visit)
    }

    fn walk_store<F>(&self, path: &str, metadata: &Metadata, visit: &mut F) -> VfsResult<()>
    where
        F: FnMut(&str, &Metadata) -> VfsResult<()>,
    {
        visit(path, metadata)?;
        if !metadata.is_dir() {
            return Ok(());
        }
        for entry in self.store.list_dir(Path::new(path))? {
            let child = paths::join(path, &entry.name);
            let child_md = self.store.metadata(Path::new(&child))?;
            self.walk_store(&child, &child_md, visit)?;
        }
        Ok(())
    }

    /// Files under `root` whose base name matches a glob `pattern`
    pub fn find_files(&self, root: &str, pattern: &str) -> VfsResult<Vec<String>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| VfsError::InvalidPattern(format!("{}: {}", pattern, e.msg)))?;

        let mut matches = Vec::new();
        self.walk(root, |path, md| {
            if !md.is_dir() && pattern.matches(paths::base_name(path)) {
                matches.push(path.to_string());
            }
            Ok(())
        })?;
        Ok(matches)
    }

    // ---- Writes ----

    /// Create or overwrite a file, creating missing parents
    pub fn write_file(&self, path: &str, data: &[u8], perms: Permissions) -> VfsResult<()> {
        self.ensure_mutable(path, "write")?;
        let logical = self.normalize(path);
        let target = Path::new(&logical);

        let result = self
            .store
            .create_dir(Path::new(&paths::parent(&logical)))
            .and_then(|_| self.store.write(target, data))
            .and_then(|_| self.store.set_permissions(target, perms));

        self.logger.scope(|| match &result {
            Ok(()) => debug!(path = %logical, bytes = data.len(), "wrote file"),
            Err(e) => error!(path = %logical, error = %e, "failed to write file"),
        });
        result
    }

    /// Create a directory and its parents; `perms` applies to the leaf
    pub fn mkdir_all(&self, path: &str, perms: Permissions) -> VfsResult<()> {
        self.ensure_mutable(path, "mkdir")?;
        let logical = self.normalize(path);
        let target = Path::new(&logical);

        let mut result = self.store.create_dir(target);
        if result.is_ok() && logical != paths::ROOT {
            result = self.store.set_permissions(target, perms);
        }
        if let Err(e) = &result {
            self.logger
                .scope(|| error!(path = %logical, error = %e, "failed to create directory"));
        }
        result
    }

    /// Remove a file or an empty directory
    pub fn remove(&self, path: &str) -> VfsResult<()> {
        self.ensure_mutable(path, "remove")?;
        self.store.delete(Path::new(&self.normalize(path)))
    }

    /// Remove a path and everything under it; missing paths are fine
    pub fn remove_all(&self, path: &str) -> VfsResult<()> {
        self.ensure_mutable(path, "remove_all")?;
        self.store.remove_dir_all(Path::new(&self.normalize(path)))
    }

    /// Store-level rename, atomic where the store is
    pub fn rename(&self, src: &str, dst: &str) -> VfsResult<()> {
        self.ensure_mutable(src, "rename")?;
        self.ensure_mutable(dst, "rename")?;
        let from = self.normalize(src);
        let to = self.normalize(dst);
        self.store.rename(Path::new(&from), Path::new(&to))?;
        self.logger
            .scope(|| debug!(from = %from, to = %to, "renamed"));
        Ok(())
    }

    // ---- Watching ----

    fn watcher(&self) -> VfsResult<&WatchManager> {
        self.watch.as_ref().ok_or_else(|| {
            VfsError::WatchUnavailable(format!(
                "watching is only available for disk instances, this one is {}",
                self.kind
            ))
        })
    }

    /// Call `callback` for every change matching `pattern`
    ///
    /// `pattern` is an exact path, a directory (matches everything below
    /// it) or a glob such as `/logs/*.log`. Callbacks run on their own
    /// threads; a panicking callback is logged and does not affect others.
    pub fn watch<F>(&self, pattern: &str, callback: F) -> VfsResult<()>
    where
        F: Fn(WatchEvent) + Send + Sync + 'static,
    {
        let manager = self.watcher()?;
        if self.bundled.is_bundled(pattern) {
            return Err(VfsError::WatchUnavailable(format!(
                "bundled path cannot be watched: {}",
                pattern
            )));
        }
        let callback: WatchCallback = Arc::new(callback);
        manager.watch(&paths::clean_absolute(pattern), callback)
    }

    pub fn stop_watch(&self, pattern: &str) -> VfsResult<()> {
        self.watcher()?.stop_watch(&self.normalize(pattern))
    }

    pub fn stop_all_watches(&self) -> VfsResult<()> {
        self.watcher()?.stop_all_watches()
    }

    pub fn is_watching(&self, pattern: &str) -> bool {
        self.watch
            .as_ref()
            .map(|w| w.is_watching(&self.normalize(pattern)))
            .unwrap_or(false)
    }

    /// Async receiver of every translated change event on this instance
    pub fn subscribe(&self) -> VfsResult<broadcast::Receiver<WatchEvent>> {
        self.watcher()?.subscribe()
    }

    /// Release watch resources; safe to call repeatedly
    pub fn close(&self) -> VfsResult<()> {
        match &self.watch {
            Some(manager) => manager.close(),
            None => Ok(()),
        }
    }
}

impl Drop for Vfs {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl fmt::Debug for Vfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vfs")
            .field("kind", &self.kind)
            .field("root", &self.root)
            .field("store", &self.store.name())
            .field("bundled", &self.bundled)
            .field("watch", &self.watch)
            .finish()
    }
}
