//! Domain types shared by every fmtgate crate.
//!
//! Paths inside a [`FileSet`] are repository-relative strings exactly as the
//! VCS reports them; they are never canonicalized so reports stay stable.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

// ---------------------------------------------------------------------------
// FileSet
// ---------------------------------------------------------------------------

/// An ordered, de-duplicated sequence of repository-relative paths.
///
/// Membership has set semantics; iteration order is insertion order so that
/// tool invocations and logs are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    paths: Vec<String>,
    seen: HashSet<String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }

    /// Keep only the paths for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let seen = &mut self.seen;
        self.paths.retain(|p| {
            if keep(p) {
                true
            } else {
                seen.remove(p);
                false
            }
        });
    }
}

impl<S: Into<String>> FromIterator<S> for FileSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// External tools fmtgate knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolName {
    /// Python style formatter and import-order linter.
    Ruff,
    /// C++ source formatter.
    ClangFormat,
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolName::Ruff => write!(f, "ruff"),
            ToolName::ClangFormat => write!(f, "clang-format"),
        }
    }
}

/// Whether a run may rewrite files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Verify only; never mutate the working tree.
    Check,
    /// Apply fixes in place.
    #[default]
    Fix,
}

impl Mode {
    pub fn from_check_flag(check: bool) -> Self {
        if check {
            Mode::Check
        } else {
            Mode::Fix
        }
    }

    pub fn is_check(self) -> bool {
        matches!(self, Mode::Check)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Check => write!(f, "check"),
            Mode::Fix => write!(f, "fix"),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of running one tool over its bucket of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationResult {
    pub tool: ToolName,
    pub mode: Mode,
    /// Files the tool flagged as needing attention, pre-fix.
    pub files: BTreeSet<String>,
}

impl ToolInvocationResult {
    pub fn empty(tool: ToolName, mode: Mode) -> Self {
        Self {
            tool,
            mode,
            files: BTreeSet::new(),
        }
    }
}

/// Aggregated result of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub mode: Mode,
    /// Union of every tool's flagged files; sorted and de-duplicated.
    pub files: BTreeSet<String>,
    pub tools: Vec<ToolInvocationResult>,
}

impl RunOutcome {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            files: BTreeSet::new(),
            tools: Vec::new(),
        }
    }

    /// Fold one tool's result into the aggregate.
    pub fn absorb(&mut self, result: ToolInvocationResult) {
        self.files.extend(result.files.iter().cloned());
        self.tools.push(result);
    }

    pub fn is_success(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_set_dedups_and_keeps_first_position() {
        let set: FileSet = ["b.py", "a.py", "b.py", "c.cpp"].into_iter().collect();
        assert_eq!(set.as_slice(), ["b.py", "a.py", "c.cpp"]);
        assert!(set.contains("a.py"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn file_set_retain_updates_membership() {
        let mut set: FileSet = ["a.py", "b.py"].into_iter().collect();
        set.retain(|p| p != "a.py");
        assert!(!set.contains("a.py"));
        assert!(set.insert("a.py"), "removed path can be re-added");
        assert_eq!(set.as_slice(), ["b.py", "a.py"]);
    }

    #[test]
    fn run_outcome_unions_tool_results() {
        let mut outcome = RunOutcome::new(Mode::Check);
        let mut ruff = ToolInvocationResult::empty(ToolName::Ruff, Mode::Check);
        ruff.files.insert("z.py".to_string());
        ruff.files.insert("a.py".to_string());
        let mut clang = ToolInvocationResult::empty(ToolName::ClangFormat, Mode::Check);
        clang.files.insert("a.py".to_string());
        clang.files.insert("m.cpp".to_string());

        outcome.absorb(ruff);
        outcome.absorb(clang);

        let files: Vec<_> = outcome.files.iter().map(String::as_str).collect();
        assert_eq!(files, ["a.py", "m.cpp", "z.py"]);
        assert!(!outcome.is_success());
        assert_eq!(outcome.tools.len(), 2);
    }

    #[test]
    fn empty_outcome_is_success() {
        assert!(RunOutcome::new(Mode::Fix).is_success());
    }

    #[test]
    fn mode_from_check_flag() {
        assert_eq!(Mode::from_check_flag(true), Mode::Check);
        assert_eq!(Mode::from_check_flag(false), Mode::Fix);
        assert!(Mode::Check.is_check());
    }
}
