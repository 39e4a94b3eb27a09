//! Error types for fmtgate-tools.

use thiserror::Error;

use fmtgate_cache::CacheError;
use fmtgate_core::ToolName;
use fmtgate_repo::RepoError;

/// Fatal failures while driving an external tool.
///
/// Findings are never errors; they come back as data in
/// [`ToolInvocationResult`](fmtgate_core::ToolInvocationResult).
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool's binary could not be acquired or verified.
    #[error("acquisition failed: {0}")]
    Cache(#[from] CacheError),

    /// The binary could not be started at all.
    #[error("{tool}: failed to run `{command}`: {source}")]
    Spawn {
        tool: ToolName,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A mutating invocation exited non-zero.
    #[error("{tool}: `{command}` exited with {status}: {stderr}")]
    Failed {
        tool: ToolName,
        command: String,
        status: String,
        stderr: String,
    },

    /// Machine-readable output did not parse.
    #[error("{tool}: unreadable output from `{command}`: {source}")]
    Json {
        tool: ToolName,
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that halts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("repository query failed: {0}")]
    Repo(#[from] RepoError),

    #[error("tool run failed: {0}")]
    Tool(#[from] ToolError),
}
