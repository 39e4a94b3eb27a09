//! Read-only repository queries for `fmtgate`.
//!
//! [`RepositoryInspector`] is the seam the orchestrator talks to;
//! [`GitRepository`] implements it by shelling out to the `git` CLI. Every
//! query is read-only and any non-zero git exit is a fatal [`RepoError`].

use std::path::{Path, PathBuf};
use std::process::Command;

use fmtgate_core::FileSet;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors from repository queries. None of them are retried.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` produced no output")]
    EmptyOutput { command: String },
}

/// Read-only view of the version-control state the orchestrator needs.
pub trait RepositoryInspector {
    /// True if any tracked file has a staged or unstaged modification or addition.
    fn is_working_tree_dirty(&self) -> Result<bool, RepoError>;

    /// Every tracked file, repository-relative.
    fn list_all_tracked_files(&self) -> Result<FileSet, RepoError>;

    /// Files changed on the current branch since it forked from `baseline`.
    ///
    /// Diffs the merge base of `HEAD` and `baseline` against `HEAD`, so commits
    /// landing on `baseline` after the fork do not show up.
    fn list_changed_files(&self, baseline: &str) -> Result<FileSet, RepoError>;
}

/// [`RepositoryInspector`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl GitRepository {
    /// Use `root` as-is; it should be the top level of a work tree.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the work tree containing `path` and root the repository there.
    ///
    /// Paths reported by every query are then relative to the top level,
    /// regardless of which subdirectory `path` pointed into.
    pub fn discover(path: &Path) -> Result<Self, RepoError> {
        let top = git(path, &["rev-parse", "--show-toplevel"])?;
        let top = top.trim();
        if top.is_empty() {
            return Err(RepoError::EmptyOutput {
                command: "git rev-parse --show-toplevel".to_string(),
            });
        }
        Ok(Self::new(top))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Commit where `HEAD` and `baseline` diverged.
    pub fn merge_base(&self, baseline: &str) -> Result<String, RepoError> {
        let out = git(&self.root, &["merge-base", "HEAD", baseline])?;
        let base = out.trim().to_string();
        if base.is_empty() {
            return Err(RepoError::EmptyOutput {
                command: format!("git merge-base HEAD {baseline}"),
            });
        }
        Ok(base)
    }
}

impl RepositoryInspector for GitRepository {
    fn is_working_tree_dirty(&self) -> Result<bool, RepoError> {
        let out = git(
            &self.root,
            &["status", "--porcelain", "--untracked-files=no"],
        )?;
        let dirty: Vec<&str> = out.lines().filter(|l| is_pending_change(l)).collect();
        if !dirty.is_empty() {
            tracing::debug!("pending changes: {dirty:?}");
        }
        Ok(!dirty.is_empty())
    }

    fn list_all_tracked_files(&self) -> Result<FileSet, RepoError> {
        let out = git(&self.root, &["ls-files", "-z"])?;
        Ok(split_nul(&out))
    }

    fn list_changed_files(&self, baseline: &str) -> Result<FileSet, RepoError> {
        let base = self.merge_base(baseline)?;
        tracing::debug!("merge base with {baseline}: {base}");
        let range = format!("{base}..HEAD");
        // Lowercase `d` excludes deletions: there is nothing left to format.
        let out = git(
            &self.root,
            &["diff", "--name-only", "-z", "--diff-filter=d", &range],
        )?;
        Ok(split_nul(&out))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Whether a `git status --porcelain` line records a modification or addition
/// in either the index (X) or the work tree (Y) column.
pub fn is_pending_change(line: &str) -> bool {
    let mut codes = line.chars().take(2);
    let (Some(x), Some(y)) = (codes.next(), codes.next()) else {
        return false;
    };
    [x, y].iter().any(|c| matches!(c, 'M' | 'A'))
}

fn split_nul(out: &str) -> FileSet {
    out.split('\0').filter(|p| !p.is_empty()).collect()
}

// ---------------------------------------------------------------------------
// Process plumbing
// ---------------------------------------------------------------------------

fn git(root: &Path, args: &[&str]) -> Result<String, RepoError> {
    let command = format!("git {}", args.join(" "));
    tracing::debug!("{command} (in {})", root.display());

    let output = Command::new("git")
        .current_dir(root)
        .args(args)
        .output()
        .map_err(|source| RepoError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(RepoError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
