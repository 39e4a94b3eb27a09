//! Orchestrator: repository → selection → routing → tools → aggregate.
//!
//! ```text
//! Start → DirtyCheck → FileSelection → Routing → ToolRun(×N) → Aggregate
//! ```
//!
//! Reporting and the exit decision belong to the caller, which maps
//! [`PipelineOutcome`] and [`PipelineError`] onto exit codes.

use std::path::Path;

use fmtgate_cache::ArtifactCache;
use fmtgate_core::{FileSet, Mode, Router, RunOutcome};
use fmtgate_repo::RepositoryInspector;

use crate::adapter::ToolAdapter;
use crate::clang_format::ClangFormatAdapter;
use crate::error::PipelineError;
use crate::ruff::RuffAdapter;

/// Which files a run looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// Every tracked file.
    All,
    /// Files changed since the merge base with the named reference.
    ChangedSince(String),
}

/// Non-fatal ways a run can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Pending modifications; nothing was selected or run.
    DirtyTree,
    /// Every tool ran; the outcome may still carry findings.
    Completed(RunOutcome),
}

/// The standard adapter set, in run order.
pub fn default_adapters(cache: &ArtifactCache, root: &Path) -> Vec<Box<dyn ToolAdapter>> {
    vec![
        Box::new(RuffAdapter::new(cache.clone(), root)),
        Box::new(ClangFormatAdapter::new(cache.clone(), root)),
    ]
}

/// One configured run over a repository.
pub struct Pipeline<'a> {
    inspector: &'a dyn RepositoryInspector,
    router: Router,
    adapters: Vec<Box<dyn ToolAdapter + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        inspector: &'a dyn RepositoryInspector,
        router: Router,
        adapters: Vec<Box<dyn ToolAdapter + 'a>>,
    ) -> Self {
        Self {
            inspector,
            router,
            adapters,
        }
    }

    /// Run every adapter once with the same `mode`.
    ///
    /// Findings from one tool never stop the next; any error halts the run
    /// without partial aggregation.
    pub fn run(
        &self,
        selection: &FileSelection,
        mode: Mode,
    ) -> Result<PipelineOutcome, PipelineError> {
        if self.inspector.is_working_tree_dirty()? {
            tracing::debug!("working tree has pending changes, aborting");
            return Ok(PipelineOutcome::DirtyTree);
        }

        let selected = match selection {
            FileSelection::All => self.inspector.list_all_tracked_files()?,
            FileSelection::ChangedSince(baseline) => {
                self.inspector.list_changed_files(baseline)?
            }
        };
        let selected = self.router.filter_ignored(&selected);
        tracing::info!("{} file(s) selected", selected.len());

        let routes = self.router.route(&selected);
        let empty = FileSet::new();

        let mut outcome = RunOutcome::new(mode);
        for adapter in &self.adapters {
            let tool = adapter.tool();
            let files = routes.get(&tool).unwrap_or(&empty);
            tracing::debug!("{tool}: {} file(s), mode {mode}", files.len());
            let result = adapter.run(files, mode)?;
            if !result.files.is_empty() {
                tracing::info!("{tool}: {} file(s) flagged", result.files.len());
            }
            outcome.absorb(result);
        }

        Ok(PipelineOutcome::Completed(outcome))
    }
}
