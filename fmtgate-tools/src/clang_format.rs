//! clang-format adapter for C++ sources.

use std::path::{Path, PathBuf};

use fmtgate_cache::{pins, ArtifactCache, CachedArtifact};
use fmtgate_core::{FileSet, Mode, ToolInvocationResult, ToolName};

use crate::adapter::ToolAdapter;
use crate::error::ToolError;
use crate::process::{stderr, ToolProcess};

const DRY_RUN: &[&str] = &["--Werror", "--dry-run"];
const IN_PLACE: &[&str] = &["-i", "--verbose"];

/// Marker clang-format puts on every diagnostic line for a formatting violation.
const VIOLATION_MARKER: &str = "-Wclang-format-violations";

/// Adapter for the pinned clang-format binary.
#[derive(Debug, Clone)]
pub struct ClangFormatAdapter {
    cache: ArtifactCache,
    artifact: CachedArtifact,
    root: PathBuf,
}

impl ClangFormatAdapter {
    pub fn new(cache: ArtifactCache, root: &Path) -> Self {
        Self::with_artifact(cache, pins::clang_format(), root)
    }

    pub fn with_artifact(cache: ArtifactCache, artifact: CachedArtifact, root: &Path) -> Self {
        Self {
            cache,
            artifact,
            root: root.to_path_buf(),
        }
    }
}

impl ToolAdapter for ClangFormatAdapter {
    fn tool(&self) -> ToolName {
        ToolName::ClangFormat
    }

    fn run(&self, files: &FileSet, mode: Mode) -> Result<ToolInvocationResult, ToolError> {
        let mut result = ToolInvocationResult::empty(ToolName::ClangFormat, mode);
        if files.is_empty() {
            return Ok(result);
        }

        let exe = self.cache.acquire(&self.artifact)?;
        let clang_format = ToolProcess::new(ToolName::ClangFormat, exe, &self.root);

        let out = clang_format.output(DRY_RUN, files)?;
        let diagnostics = stderr(&out);
        let violating = parse_violations(&diagnostics);
        if !out.status.success() && violating.is_empty() {
            tracing::warn!(
                "clang-format exited with {} without reporting violations: {}",
                out.status,
                diagnostics.trim()
            );
        }

        if !violating.is_empty() && !mode.is_check() {
            tracing::info!("clang-format: reformatting {} file(s)", violating.len());
            clang_format.run_checked(IN_PLACE, &violating)?;
        }

        result.files.extend(violating.iter().map(str::to_string));
        Ok(result)
    }
}

/// Files named on `--dry-run --Werror` diagnostic lines, first-seen order.
///
/// Each violation line looks like
/// `src/main.cpp:12:5: error: code should be clang-formatted [-Wclang-format-violations]`;
/// the path is everything before the first colon. Echoed source lines and
/// caret lines carry no marker and are skipped.
pub fn parse_violations(stderr: &str) -> FileSet {
    stderr
        .lines()
        .filter(|line| line.contains(VIOLATION_MARKER))
        .filter_map(|line| line.split(':').next())
        .filter(|path| !path.is_empty())
        .collect()
}
