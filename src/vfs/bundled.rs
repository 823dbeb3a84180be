/*!
 * Bundled Registry
 * Routes `prefix://path` URLs to read-only archives
 */

use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use super::paths::{to_archive_path, BUNDLED_SEPARATOR};
use super::traits::Archive;
use super::types::*;

/// One registered archive: prefix, handle and subdirectory offset
pub struct BundledFs {
    archive: Arc<dyn Archive>,
    prefix: String,
    subdir: String,
}

impl BundledFs {
    fn new(prefix: String, archive: Arc<dyn Archive>, subdir: &str) -> Self {
        Self {
            archive,
            prefix,
            subdir: to_archive_path(subdir),
        }
    }

    /// Prefix name without the separator
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn subdir(&self) -> &str {
        &self.subdir
    }

    /// Externally visible URL for an archive-relative path
    pub fn url(&self, rel: &str) -> String {
        format!("{}{}{}", self.prefix, BUNDLED_SEPARATOR, rel)
    }

    /// Apply the subdirectory offset
    fn full_path(&self, rel: &str) -> String {
        let rel = to_archive_path(rel);
        match (self.subdir.is_empty(), rel.is_empty()) {
            (true, _) => rel,
            (false, true) => self.subdir.clone(),
            (false, false) => format!("{}/{}", self.subdir, rel),
        }
    }

    /// Strip the subdirectory offset from an archive path
    fn original_path<'a>(&self, full: &'a str) -> &'a str {
        if self.subdir.is_empty() {
            return full;
        }
        match full.strip_prefix(self.subdir.as_str()) {
            Some("") => "",
            Some(rest) => rest.strip_prefix('/').unwrap_or(full),
            None => full,
        }
    }

    pub fn read_file(&self, rel: &str) -> VfsResult<Vec<u8>> {
        self.archive.read(&self.full_path(rel))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.archive.exists(&self.full_path(rel))
    }

    pub fn is_dir(&self, rel: &str) -> bool {
        self.stat(rel).map(|md| md.is_dir()).unwrap_or(false)
    }

    pub fn stat(&self, rel: &str) -> VfsResult<Metadata> {
        self.archive.metadata(&self.full_path(rel))
    }

    pub fn list_files(&self, rel: &str) -> VfsResult<Vec<String>> {
        Ok(self
            .archive
            .list_dir(&self.full_path(rel))?
            .into_iter()
            .filter(|e| !e.is_dir())
            .map(|e| e.name)
            .collect())
    }

    pub fn list_dirs(&self, rel: &str) -> VfsResult<Vec<String>> {
        Ok(self
            .archive
            .list_dir(&self.full_path(rel))?
            .into_iter()
            .filter(|e| e.is_dir())
            .map(|e| e.name)
            .collect())
    }

    /// Pre-order walk; the visitor receives `prefix://<path>` URLs
    pub fn walk<F>(&self, rel: &str, visit: &mut F) -> VfsResult<()>
    where
        F: FnMut(&str, &Metadata) -> VfsResult<()>,
    {
        let root = self.full_path(rel);
        self.walk_full(&root, visit)
    }

    fn walk_full<F>(&self, full: &str, visit: &mut F) -> VfsResult<()>
    where
        F: FnMut(&str, &Metadata) -> VfsResult<()>,
    {
        let metadata = self.archive.metadata(full)?;
        visit(&self.url(self.original_path(full)), &metadata)?;

        if metadata.is_dir() {
            for entry in self.archive.list_dir(full)? {
                let child = if full.is_empty() {
                    entry.name
                } else {
                    format!("{}/{}", full, entry.name)
                };
                self.walk_full(&child, visit)?;
            }
        }
        Ok(())
    }

    pub fn archive_name(&self) -> &str {
        self.archive.name()
    }
}

impl fmt::Debug for BundledFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundledFs")
            .field("prefix", &self.prefix)
            .field("subdir", &self.subdir)
            .field("archive", &self.archive.name())
            .finish()
    }
}

/// Prefix → archive map
///
/// Resolution picks the longest matching prefix. The order vector's lock
/// is held across every map mutation, so readers never observe a prefix
/// without its entry.
pub struct BundledRegistry {
    entries: DashMap<String, Arc<BundledFs>, RandomState>,
    order: RwLock<Vec<String>>, // sentinel-qualified keys, longest first
}

impl BundledRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Register an archive under `prefix`; an existing prefix is replaced
    pub fn register(
        &self,
        prefix: &str,
        archive: Arc<dyn Archive>,
        subdir: &str,
    ) -> VfsResult<()> {
        let name = prefix.strip_suffix(BUNDLED_SEPARATOR).unwrap_or(prefix);
        if name.is_empty() {
            return Err(VfsError::InvalidArgument(
                "bundled prefix cannot be empty".to_string(),
            ));
        }
        let key = format!("{}{}", name, BUNDLED_SEPARATOR);
        let bundled = Arc::new(BundledFs::new(name.to_string(), archive, subdir));

        let mut order = self.order.write();
        if self.entries.insert(key.clone(), bundled).is_none() {
            order.push(key);
            order.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        }
        Ok(())
    }

    /// Find the archive for a full path and the archive-relative remainder
    pub fn resolve(&self, path: &str) -> Option<(Arc<BundledFs>, String)> {
        let order = self.order.read();
        order.iter().find_map(|key| {
            let rest = path.strip_prefix(key.as_str())?;
            let entry = self.entries.get(key)?;
            Some((Arc::clone(entry.value()), rest.to_string()))
        })
    }

    pub fn is_bundled(&self, path: &str) -> bool {
        let order = self.order.read();
        order.iter().any(|key| path.starts_with(key.as_str()))
    }

    /// Registered prefix names, sentinel stripped, alphabetical
    pub fn list(&self) -> Vec<String> {
        let order = self.order.read();
        let mut names: Vec<String> = order
            .iter()
            .map(|key| key.trim_end_matches(BUNDLED_SEPARATOR).to_string())
            .collect();
        names.sort();
        names
    }

    /// Look up by bare prefix name
    pub fn get(&self, prefix: &str) -> Option<Arc<BundledFs>> {
        let key = format!("{}{}", prefix, BUNDLED_SEPARATOR);
        self.entries.get(&key).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BundledRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BundledRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundledRegistry")
            .field("prefixes", &self.list())
            .finish()
    }
}
