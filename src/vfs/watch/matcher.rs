/*!
 * Watch Patterns
 * Exact, directory-prefix and glob matching of logical paths
 */

use glob::{MatchOptions, Pattern};

use super::super::paths::{is_glob, literal_base, ROOT};
use super::super::types::{VfsError, VfsResult};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A parsed watch pattern
#[derive(Debug, Clone)]
pub struct WatchPattern {
    raw: String,
    glob: Option<Pattern>,
}

impl WatchPattern {
    pub fn parse(pattern: &str) -> VfsResult<Self> {
        let glob = if is_glob(pattern) {
            Some(Pattern::new(pattern).map_err(|e| {
                VfsError::InvalidPattern(format!("{}: {}", pattern, e.msg))
            })?)
        } else {
            None
        };
        Ok(Self {
            raw: pattern.to_string(),
            glob,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Exact path, then root, then directory containment, then glob
    pub fn matches(&self, path: &str) -> bool {
        if path == self.raw || self.raw == ROOT {
            return true;
        }
        if let Some(rest) = path.strip_prefix(self.raw.as_str()) {
            if rest.starts_with('/') {
                return true;
            }
        }
        self.glob
            .as_ref()
            .map(|g| g.matches_with(path, MATCH_OPTIONS))
            .unwrap_or(false)
    }

    /// Logical path the native layer has to observe for this pattern
    pub fn native_target(&self) -> String {
        if self.glob.is_some() {
            literal_base(&self.raw)
        } else {
            self.raw.clone()
        }
    }
}
