//! ruff adapter: Python formatting plus import-order lint.
//!
//! Sequence per run:
//! 1. `ruff format --check` → files that would be reformatted.
//! 2. fix mode: `ruff format` on exactly those files.
//! 3. `ruff check --extend-select=I --output-format=json` → files with findings.
//! 4. when there are findings: `ruff check --extend-select=I [--fix]` over the
//!    whole input, echoing its human-readable report.
//!
//! ruff exits 0 for clean, 1 for findings and 2 for abnormal termination.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Output;

use serde::Deserialize;

use fmtgate_cache::{pins, ArtifactCache, CachedArtifact};
use fmtgate_core::{FileSet, Mode, ToolInvocationResult, ToolName};

use crate::adapter::ToolAdapter;
use crate::error::ToolError;
use crate::process::{stderr, stdout, ToolProcess};

const FORMAT: &[&str] = &["format"];
const FORMAT_CHECK: &[&str] = &["format", "--check"];
const LINT_JSON: &[&str] = &["check", "--extend-select=I", "--output-format=json"];
const LINT_REPORT: &[&str] = &["check", "--extend-select=I"];
const LINT_FIX: &[&str] = &["check", "--extend-select=I", "--fix"];

const WOULD_REFORMAT: &str = "Would reformat: ";

/// Adapter for the pinned ruff release.
#[derive(Debug, Clone)]
pub struct RuffAdapter {
    cache: ArtifactCache,
    artifact: CachedArtifact,
    root: PathBuf,
}

impl RuffAdapter {
    /// ruff from the compiled-in pin, run inside `root`.
    pub fn new(cache: ArtifactCache, root: &Path) -> Self {
        Self::with_artifact(cache, pins::ruff(), root)
    }

    pub fn with_artifact(cache: ArtifactCache, artifact: CachedArtifact, root: &Path) -> Self {
        Self {
            cache,
            artifact,
            root: root.to_path_buf(),
        }
    }
}

impl ToolAdapter for RuffAdapter {
    fn tool(&self) -> ToolName {
        ToolName::Ruff
    }

    fn run(&self, files: &FileSet, mode: Mode) -> Result<ToolInvocationResult, ToolError> {
        let mut result = ToolInvocationResult::empty(ToolName::Ruff, mode);
        if files.is_empty() {
            return Ok(result);
        }

        let exe = self.cache.acquire(&self.artifact)?;
        let ruff = ToolProcess::new(ToolName::Ruff, exe, &self.root);

        let out = ruff.output(FORMAT_CHECK, files)?;
        warn_if_abnormal(&out, "format --check");
        let unformatted = parse_would_reformat(&stdout(&out));
        if !unformatted.is_empty() && !mode.is_check() {
            tracing::info!("ruff: reformatting {} file(s)", unformatted.len());
            ruff.run_checked(FORMAT, &unformatted)?;
        }

        let out = ruff.output(LINT_JSON, files)?;
        warn_if_abnormal(&out, "check");
        let linted = parse_lint_json(&stdout(&out), &self.root).map_err(|source| {
            ToolError::Json {
                tool: ToolName::Ruff,
                command: ruff.describe(LINT_JSON, files),
                source,
            }
        })?;

        if !linted.is_empty() {
            // Runs over the full input: fixing one finding can surface or
            // resolve others in files that were not flagged.
            let args = if mode.is_check() { LINT_REPORT } else { LINT_FIX };
            let out = ruff.output(args, files)?;
            echo_report(&out);
            if !mode.is_check() && is_abnormal(&out) {
                return Err(ruff.failed(args, files, &out));
            }
        }

        result.files.extend(unformatted.iter().map(str::to_string));
        result.files.extend(linted);
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

/// Paths from `ruff format --check` stdout (`Would reformat: <path>` lines).
pub fn parse_would_reformat(stdout: &str) -> FileSet {
    stdout
        .lines()
        .filter_map(|line| line.trim_end().strip_prefix(WOULD_REFORMAT))
        .collect()
}

#[derive(Debug, Deserialize)]
struct LintDiagnostic {
    filename: PathBuf,
}

/// Repository-relative paths from `ruff check --output-format=json`.
///
/// ruff reports absolute paths; they are made relative to `root` (as given
/// or canonicalized). Paths outside `root` are kept verbatim.
pub fn parse_lint_json(stdout: &str, root: &Path) -> Result<BTreeSet<String>, serde_json::Error> {
    let diagnostics: Vec<LintDiagnostic> = serde_json::from_str(stdout.trim())?;
    let canonical_root = root.canonicalize().ok();
    Ok(diagnostics
        .into_iter()
        .map(|d| relative_to_root(&d.filename, root, canonical_root.as_deref()))
        .collect())
}

fn relative_to_root(path: &Path, root: &Path, canonical_root: Option<&Path>) -> String {
    let relative = path
        .strip_prefix(root)
        .ok()
        .or_else(|| canonical_root.and_then(|r| path.strip_prefix(r).ok()))
        .unwrap_or(path);
    relative.to_string_lossy().into_owned()
}

/// Anything but 0 (clean) or 1 (findings), including death by signal.
fn is_abnormal(output: &Output) -> bool {
    !matches!(output.status.code(), Some(0) | Some(1))
}

fn warn_if_abnormal(output: &Output, what: &str) {
    if is_abnormal(output) {
        tracing::warn!("ruff {what} terminated abnormally: {}", stderr(output).trim());
    }
}

fn echo_report(output: &Output) {
    let report = format!("{}{}", stdout(output), stderr(output));
    let report = report.trim();
    if !report.is_empty() {
        tracing::warn!("ruff lint findings:\n{report}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_reformat_lines_are_extracted() {
        let out = "Would reformat: scripts/a.py\nWould reformat: b.py\n2 files would be reformatted, 3 files already formatted\n";
        assert_eq!(parse_would_reformat(out).as_slice(), ["scripts/a.py", "b.py"]);
    }

    #[test]
    fn clean_format_check_yields_nothing() {
        assert!(parse_would_reformat("4 files already formatted\n").is_empty());
    }

    #[test]
    fn lint_json_paths_are_made_repository_relative() {
        let root = Path::new("/work/repo");
        let json = r#"[
            {"code":"I001","filename":"/work/repo/tools/gen.py","message":"Import block is un-sorted or un-formatted"},
            {"code":"F401","filename":"/work/repo/tools/gen.py","message":"`os` imported but unused"},
            {"code":"I001","filename":"/work/repo/main.py","message":"Import block is un-sorted or un-formatted"}
        ]"#;
        let files = parse_lint_json(json, root).unwrap();
        let files: Vec<_> = files.iter().map(String::as_str).collect();
        assert_eq!(files, ["main.py", "tools/gen.py"]);
    }

    #[test]
    fn empty_lint_array_means_no_findings() {
        assert!(parse_lint_json("[]\n", Path::new("/r")).unwrap().is_empty());
    }

    #[test]
    fn paths_outside_root_are_kept_verbatim() {
        let files = parse_lint_json(r#"[{"filename":"/elsewhere/x.py"}]"#, Path::new("/r")).unwrap();
        assert!(files.contains("/elsewhere/x.py"));
    }

    #[test]
    fn non_json_output_is_an_error() {
        assert!(parse_lint_json("error: Failed to parse pyproject.toml", Path::new("/r")).is_err());
    }
}
