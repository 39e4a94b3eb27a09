//! File router: splits a [`FileSet`] into one bucket per tool.
//!
//! Routing is pure: no I/O, no side effects, order-preserving. Ignored paths
//! and paths without a recognized extension land in no bucket.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::config::DEFAULT_IGNORE;
use crate::types::{FileSet, ToolName};

/// Buckets keyed by tool. Tools with nothing to do have no entry.
pub type Routes = BTreeMap<ToolName, FileSet>;

/// Extension groups, matched against the path's final extension.
const RUFF_EXTENSIONS: &[&str] = &["py"];
const CLANG_FORMAT_EXTENSIONS: &[&str] = &["cpp", "hpp"];

/// Classify a single path by its final extension.
pub fn tool_for_path(path: &str) -> Option<ToolName> {
    let ext = Path::new(path).extension()?.to_str()?;
    if RUFF_EXTENSIONS.contains(&ext) {
        Some(ToolName::Ruff)
    } else if CLANG_FORMAT_EXTENSIONS.contains(&ext) {
        Some(ToolName::ClangFormat)
    } else {
        None
    }
}

/// Ignore-list aware router.
#[derive(Debug, Clone)]
pub struct Router {
    ignore: HashSet<String>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE.iter().copied())
    }
}

impl Router {
    pub fn new<I, S>(ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore: ignore.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.contains(path)
    }

    /// Drop permanently ignored paths.
    pub fn filter_ignored(&self, files: &FileSet) -> FileSet {
        files.iter().filter(|p| !self.is_ignored(p)).collect()
    }

    /// Partition `files` into per-tool buckets.
    pub fn route(&self, files: &FileSet) -> Routes {
        let mut routes = Routes::new();
        for path in files.iter() {
            if self.is_ignored(path) {
                tracing::debug!("ignored: {path}");
                continue;
            }
            match tool_for_path(path) {
                Some(tool) => {
                    routes.entry(tool).or_default().insert(path);
                }
                None => tracing::trace!("no tool for: {path}"),
            }
        }
        routes
    }
}
