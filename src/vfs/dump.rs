/*!
 * Tree Dump
 * Human-readable rendering of the mutable tree and every bundled archive
 */

use std::collections::BTreeMap;
use std::io::Write;
use tracing::warn;

use super::paths::{self, BUNDLED_SEPARATOR, ROOT};
use super::types::*;
use super::unified::Vfs;

/// parent → children, both as full paths; children stay sorted
type Tree = BTreeMap<String, Vec<String>>;

impl Vfs {
    /// Write the tree of the mutable namespace, then one subtree per
    /// bundled prefix
    ///
    /// ```text
    /// --- VFS Root ---
    /// ├── dir
    /// │   └── b.txt
    /// └── a.txt
    /// ```
    pub fn dump<W: Write>(&self, out: &mut W) -> VfsResult<()> {
        emit(out, "--- VFS Root ---\n")?;

        let mut tree = Tree::new();
        self.walk(ROOT, |path, _| {
            if path != ROOT {
                tree.entry(paths::parent(path))
                    .or_default()
                    .push(path.to_string());
            }
            Ok(())
        })?;
        print_tree(out, &tree, ROOT, "")?;

        let prefixes = self.list_bundled();
        if prefixes.is_empty() {
            return Ok(());
        }

        emit(out, "\n--- Bundled Filesystems ---\n")?;
        for prefix in prefixes {
            let Some(bundled) = self.registry().get(&prefix) else {
                continue;
            };
            emit(out, &format!("Bundle [{}{}]:\n", prefix, BUNDLED_SEPARATOR))?;

            let url_prefix = format!("{}{}", prefix, BUNDLED_SEPARATOR);
            let mut tree = Tree::new();
            let walked = bundled.walk("", &mut |url: &str, _: &Metadata| {
                let rel = url.strip_prefix(url_prefix.as_str()).unwrap_or(url);
                if !rel.is_empty() {
                    let parent = rel.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
                    tree.entry(parent.to_string())
                        .or_default()
                        .push(rel.to_string());
                }
                Ok(())
            });
            // An unreadable archive still gets its header; whatever was
            // walked before the failure is printed
            if let Err(e) = walked {
                self.logger().scope(|| {
                    warn!(prefix = %prefix, error = %e, "failed to walk bundled filesystem")
                });
            }
            print_tree(out, &tree, "", "  ")?;
        }
        Ok(())
    }
}

fn print_tree<W: Write>(out: &mut W, tree: &Tree, dir: &str, indent: &str) -> VfsResult<()> {
    let Some(children) = tree.get(dir) else {
        return Ok(());
    };
    let mut children = children.clone();
    children.sort();

    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let connector = if last { "└── " } else { "├── " };
        emit(
            out,
            &format!("{}{}{}\n", indent, connector, paths::base_name(child)),
        )?;

        if tree.contains_key(child) {
            let nested = format!("{}{}", indent, if last { "    " } else { "│   " });
            print_tree(out, tree, child, &nested)?;
        }
    }
    Ok(())
}

fn emit<W: Write>(out: &mut W, text: &str) -> VfsResult<()> {
    out.write_all(text.as_bytes())
        .map_err(|e| VfsError::from_io(e, "dump"))
}
