//! The capability every external tool is wrapped in.

use fmtgate_core::{FileSet, Mode, ToolInvocationResult, ToolName};

use crate::error::ToolError;

/// Verify-or-fix contract shared by all tools.
///
/// Implementations own binary acquisition and the parsing of their tool's
/// diagnostic format; callers only ever see the set of flagged files.
pub trait ToolAdapter {
    fn tool(&self) -> ToolName;

    /// Inspect `files` (already routed to this tool) and, in [`Mode::Fix`],
    /// rewrite the offending ones in place.
    ///
    /// The returned set lists what needed attention before any fix ran. An
    /// empty `files` must return an empty result without running anything.
    fn run(&self, files: &FileSet, mode: Mode) -> Result<ToolInvocationResult, ToolError>;
}
